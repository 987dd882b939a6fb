//! Chilean RUT/RUN handling.
//!
//! A RUT is a body of up to 8 digits plus a modulo-11 check digit (`0`-`9`
//! or `K`). Input may carry dots, spaces, a hyphen and a lowercase `k`;
//! the canonical stored form is `BODY-DV` without dots.

/// Parsed, checksum-valid RUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rut {
    body: u32,
    verifier: char,
}

impl Rut {
    pub fn parse(input: &str) -> Result<Self, &'static str> {
        let (body, verifier) = split(input)?;
        if compute_verifier(body) != verifier {
            return Err("El dígito verificador del RUT no es válido");
        }
        Ok(Self { body, verifier })
    }

    pub fn body(&self) -> u32 {
        self.body
    }

    pub fn verifier(&self) -> char {
        self.verifier
    }

    /// `12345678-5`
    pub fn canonical(&self) -> String {
        format!("{}-{}", self.body, self.verifier)
    }

    /// `12.345.678-5`
    pub fn display(&self) -> String {
        let digits = self.body.to_string();
        let mut grouped = String::with_capacity(digits.len() + 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        format!("{}-{}", grouped, self.verifier)
    }
}

impl std::fmt::Display for Rut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl std::str::FromStr for Rut {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rut::parse(s)
    }
}

/// Modulo-11 check digit, weights 2..=7 cycling from the rightmost digit
pub fn compute_verifier(body: u32) -> char {
    let mut sum = 0u32;
    let mut weight = 2u32;
    let mut rest = body;
    loop {
        sum += (rest % 10) * weight;
        rest /= 10;
        weight = if weight == 7 { 2 } else { weight + 1 };
        if rest == 0 {
            break;
        }
    }
    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from_digit(d, 10).unwrap_or('0'),
    }
}

fn split(input: &str) -> Result<(u32, char), &'static str> {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '.' | ' ' | '-'))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.len() < 2 {
        return Err("El RUT es demasiado corto");
    }

    let (body, verifier) = cleaned.split_at(cleaned.len() - 1);
    let verifier = verifier.chars().next().unwrap_or(' ');
    if !(verifier.is_ascii_digit() || verifier == 'K') {
        return Err("El dígito verificador debe ser un número o K");
    }
    if body.is_empty() || body.len() > 8 || !body.chars().all(|c| c.is_ascii_digit()) {
        return Err("El cuerpo del RUT debe tener entre 1 y 8 dígitos");
    }
    let body: u32 = body.parse().map_err(|_| "El cuerpo del RUT no es numérico")?;
    if body == 0 {
        return Err("El cuerpo del RUT no puede ser cero");
    }
    Ok((body, verifier))
}

/// Canonical form of a valid RUT
pub fn normalize_rut(input: &str) -> Result<String, &'static str> {
    Rut::parse(input).map(|r| r.canonical())
}

pub fn is_valid_rut(input: &str) -> bool {
    Rut::parse(input).is_ok()
}

/// Loose check used to tell a RUT login identifier from an email
pub fn looks_like_rut(input: &str) -> bool {
    !input.contains('@') && split(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_verifiers() {
        assert_eq!(compute_verifier(12_345_678), '5');
        assert_eq!(compute_verifier(11_111_111), '1');
        assert_eq!(compute_verifier(10_000_013), 'K');
        assert_eq!(compute_verifier(1), '9');
    }

    #[test]
    fn test_accepts_common_formats() {
        for input in ["12.345.678-5", "12345678-5", "123456785", " 12 345 678 - 5 "] {
            assert_eq!(normalize_rut(input).unwrap(), "12345678-5", "{input}");
        }
        assert_eq!(normalize_rut("10.000.013-k").unwrap(), "10000013-K");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Rut::parse("12.345.678-4").is_err());
        assert!(Rut::parse("").is_err());
        assert!(Rut::parse("5").is_err());
        assert!(Rut::parse("123456789-0").is_err());
        assert!(Rut::parse("12A45678-5").is_err());
        assert!(Rut::parse("12345678-X").is_err());
        assert!(Rut::parse("0-0").is_err());
    }

    #[test]
    fn test_display_format() {
        let rut = Rut::parse("123456785").unwrap();
        assert_eq!(rut.display(), "12.345.678-5");
        assert_eq!(Rut::parse("1-9").unwrap().display(), "1-9");
        assert_eq!(Rut::parse("7654321-6").unwrap().display(), "7.654.321-6");
    }

    #[test]
    fn test_computed_verifier_always_validates() {
        for body in [1u32, 9, 99, 1_000_000, 5_126_663, 76_086_428, 99_999_999] {
            let rut = format!("{}-{}", body, compute_verifier(body));
            let parsed = Rut::parse(&rut).unwrap();
            assert_eq!(parsed.body(), body);
            assert_eq!(parsed.canonical(), rut);
        }
    }

    #[test]
    fn test_looks_like_rut() {
        assert!(looks_like_rut("12.345.678-5"));
        assert!(!looks_like_rut("ana@colegio.cl"));
    }
}
