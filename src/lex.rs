//! Análisis léxico.
//!
//! # Tokenization
//! Esta fase descompone el fuente en unidades léxicas clasificadas.
//! A diferencia de un lexer de autómata, aquí se aplica un catálogo
//! ordenado de categorías léxicas sobre cada línea: cada patrón del
//! catálogo se evalúa de forma exhaustiva (todas sus ocurrencias no
//! traslapadas dentro de la línea) y cada coincidencia produce un
//! token con línea y columna 1-based. Al final el flujo completo se
//! ordena de manera estable por `(línea, columna)`.
//!
//! # Orden del catálogo
//! El orden importa por dos razones. Primero, los patrones de
//! palabra clave y de literal deben anteceder al patrón genérico de
//! identificador; como el catálogo se aplica por categoría y no por
//! posición, una palabra como `int` produce tanto su token de
//! palabra clave como un token de identificador en la misma columna,
//! y el orden estable garantiza que la palabra clave aparezca
//! primero. Segundo, los operadores multicarácter anteceden a los de
//! un carácter, de modo que `==` se registre como igualdad además de
//! las dos apariciones de asignación que el patrón de `=` encuentra
//! por su cuenta. Los traslapes no se deduplican: son parte del
//! contrato de esta fase.
//!
//! # Errores
//! No hay condición de error: un carácter que ningún patrón cubre
//! simplemente no genera token alguno.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Categoría mayor de una unidad léxica.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Keyword,
    Identifier,
    Literal,
    Operator,
    Delimiter,
}

/// Subtipo concreto de un token dentro de su categoría.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Tipos de dato
    Int,
    Float,
    String,
    Bool,
    Void,

    // Control de flujo
    If,
    Else,
    While,
    For,
    Do,
    Break,
    Continue,

    // Funciones
    Function,
    Return,
    Call,

    // Entrada/salida
    Print,
    Input,

    // Literales
    BoolLiteral,
    StringLiteral,
    FloatLiteral,
    Number,

    Identifier,

    // Operadores
    Eq,
    Neq,
    Leq,
    Geq,
    And,
    Or,
    Increment,
    Decrement,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Assign,
    Lt,
    Gt,
    Not,

    // Delimitadores
    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,
    Semicolon,
    Comma,
    Dot,
}

/// Objeto resultante del análisis léxico.
///
/// Un token es inmutable y contiene suficiente información para
/// ubicar su lexema exacto en el fuente original: para todo token,
/// el lexema es igual a la subcadena de `length` bytes que comienza
/// en la columna `column` de la línea `line`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub category: Category,
    pub value: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

/// Conteos derivados del flujo de tokens.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub total_tokens: usize,
    pub keywords: usize,
    pub identifiers: usize,
    pub operators: usize,
    pub literals: usize,
    pub delimiters: usize,
}

/// Resultado completo de la fase léxica.
#[derive(Clone, Debug, Serialize)]
pub struct TokenStream {
    pub phase: &'static str,
    pub success: bool,
    pub tokens: Vec<Token>,
    pub statistics: Statistics,
}

lazy_static! {
    /// Catálogo ordenado de categorías léxicas.
    ///
    /// Palabras clave y literales antes del identificador genérico;
    /// operadores multicarácter antes que los de un carácter.
    static ref CATALOG: Vec<(Regex, Category, TokenKind)> = {
        use Category::*;
        use TokenKind as K;

        let entries: &[(&str, Category, TokenKind)] = &[
            // Tipos de dato
            (r"\bint\b", Keyword, K::Int),
            (r"\bfloat\b", Keyword, K::Float),
            (r"\bstring\b", Keyword, K::String),
            (r"\bbool\b", Keyword, K::Bool),
            (r"\bvoid\b", Keyword, K::Void),

            // Control de flujo
            (r"\bif\b", Keyword, K::If),
            (r"\belse\b", Keyword, K::Else),
            (r"\bwhile\b", Keyword, K::While),
            (r"\bfor\b", Keyword, K::For),
            (r"\bdo\b", Keyword, K::Do),
            (r"\bbreak\b", Keyword, K::Break),
            (r"\bcontinue\b", Keyword, K::Continue),

            // Funciones
            (r"\bfunction\b", Keyword, K::Function),
            (r"\breturn\b", Keyword, K::Return),
            (r"\bcall\b", Keyword, K::Call),

            // Entrada/salida
            (r"\bprint\b", Keyword, K::Print),
            (r"\binput\b", Keyword, K::Input),

            // Literales booleanos
            (r"\btrue\b", Literal, K::BoolLiteral),
            (r"\bfalse\b", Literal, K::BoolLiteral),

            // Literales de cadena, con escapes
            (r#""([^"\\]|\\.)*""#, Literal, K::StringLiteral),
            (r"'([^'\\]|\\.)*'", Literal, K::StringLiteral),

            // Identificadores, después de toda palabra clave
            (r"[a-zA-Z][a-zA-Z0-9_]*", Identifier, K::Identifier),

            // Literales numéricos, flotante antes que entero
            (r"\d+\.\d+", Literal, K::FloatLiteral),
            (r"\d+", Literal, K::Number),

            // Operadores multicarácter
            (r"==", Operator, K::Eq),
            (r"!=", Operator, K::Neq),
            (r"<=", Operator, K::Leq),
            (r">=", Operator, K::Geq),
            (r"&&", Operator, K::And),
            (r"\|\|", Operator, K::Or),
            (r"\+\+", Operator, K::Increment),
            (r"--", Operator, K::Decrement),

            // Operadores de un carácter
            (r"\+", Operator, K::Plus),
            (r"-", Operator, K::Minus),
            (r"\*", Operator, K::Multiply),
            (r"/", Operator, K::Divide),
            (r"%", Operator, K::Modulo),
            (r"=", Operator, K::Assign),
            (r"<", Operator, K::Lt),
            (r">", Operator, K::Gt),
            (r"!", Operator, K::Not),

            // Delimitadores
            (r"\(", Delimiter, K::Lparen),
            (r"\)", Delimiter, K::Rparen),
            (r"\{", Delimiter, K::Lbrace),
            (r"\}", Delimiter, K::Rbrace),
            (r"\[", Delimiter, K::Lbracket),
            (r"\]", Delimiter, K::Rbracket),
            (r";", Delimiter, K::Semicolon),
            (r",", Delimiter, K::Comma),
            (r"\.", Delimiter, K::Dot),
        ];

        entries
            .iter()
            .map(|&(pattern, category, kind)| {
                (Regex::new(pattern).unwrap(), category, kind)
            })
            .collect()
    };
}

/// Reduce el fuente a un flujo de tokens ordenado por posición.
pub fn tokenize(source: &str) -> TokenStream {
    let mut tokens = Vec::new();

    for (line_number, line) in source.lines().enumerate() {
        for (pattern, category, kind) in CATALOG.iter() {
            for found in pattern.find_iter(line) {
                tokens.push(Token {
                    kind: *kind,
                    category: *category,
                    value: found.as_str().to_owned(),
                    line: line_number + 1,
                    column: found.start() + 1,
                    length: found.as_str().len(),
                });
            }
        }
    }

    // Orden estable: los traslapes conservan el orden del catálogo
    tokens.sort_by_key(|token| (token.line, token.column));

    let statistics = derive_statistics(&tokens);
    TokenStream {
        phase: "lexer",
        success: true,
        tokens,
        statistics,
    }
}

fn derive_statistics(tokens: &[Token]) -> Statistics {
    let count = |category| tokens.iter().filter(|t| t.category == category).count();

    Statistics {
        total_tokens: tokens.len(),
        keywords: count(Category::Keyword),
        identifiers: count(Category::Identifier),
        operators: count(Category::Operator),
        literals: count(Category::Literal),
        delimiters: count(Category::Delimiter),
    }
}
