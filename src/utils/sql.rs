use sea_orm::{ColumnTrait, Condition, sea_query::LikeExpr};

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE
pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `col LIKE '%input%' ESCAPE '\'` with `input` taken literally
pub fn contains_literal<C: ColumnTrait>(col: C, input: &str) -> Condition {
    let pattern = format!("%{}%", escape_like_pattern(input));
    Condition::all().add(col.like(LikeExpr::new(pattern).escape('\\')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("ana"), "ana");
        assert_eq!(escape_like_pattern("50%"), "50\\%");
        assert_eq!(escape_like_pattern("a_b"), "a\\_b");
        assert_eq!(escape_like_pattern("c:\\x"), "c:\\\\x");
    }
}
