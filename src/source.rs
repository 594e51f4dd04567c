//! Recorrido del código fuente por líneas físicas.
//!
//! Las fases orientadas a sentencias y el intérprete procesan el
//! programa línea por línea. Este módulo centraliza la numeración
//! 1-based y el recorte de espacios para que todas las fases
//! coincidan en qué línea le atribuyen a cada constructo.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"[a-zA-Z][a-zA-Z0-9_]*").unwrap();
}

/// Itera las líneas físicas del fuente, recortadas y numeradas desde 1.
///
/// No filtra comentarios ni líneas en blanco; cada fase decide qué
/// líneas descarta.
pub fn numbered_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
}

/// Extrae los identificadores de una expresión, sin repetidos y en
/// orden de aparición. No distingue palabras clave; el llamador las
/// filtra si le corresponde.
pub fn identifiers(expression: &str) -> Vec<String> {
    let mut found = Vec::new();
    for capture in IDENTIFIER.find_iter(expression) {
        let name = capture.as_str();
        if !found.iter().any(|seen| seen == name) {
            found.push(name.to_owned());
        }
    }

    found
}

/// Determina si un texto completo es una constante numérica, con o
/// sin punto decimal.
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_numbered_from_one() {
        let collected: Vec<_> = numbered_lines("a\n  b\n\nc").collect();
        assert_eq!(collected, vec![(1, "a"), (2, "b"), (3, ""), (4, "c")]);
    }

    #[test]
    fn identifiers_are_deduplicated_in_order() {
        assert_eq!(identifiers("x + y * x"), vec!["x", "y"]);
        assert!(identifiers("1 + 2").is_empty());
    }

    #[test]
    fn numeric_detection_accepts_floats() {
        assert!(is_numeric("42"));
        assert!(is_numeric("3.5"));
        assert!(is_numeric("-7"));
        assert!(!is_numeric("x1"));
        assert!(!is_numeric(""));
    }
}
