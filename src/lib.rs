//! Compilador educativo CodeWizard.
//!
//! # Pipeline
//! Cada programa deriva de una única cadena de código fuente. El
//! texto se somete primero a análisis léxico en [`lex`], de lo cual
//! se obtiene un flujo de tokens clasificados. De forma paralela,
//! [`recognize`] reduce el fuente a una secuencia de sentencias
//! tipificadas, línea por línea; sobre esa secuencia operan la
//! construcción de estructura sintáctica en [`parse`], el análisis
//! semántico en [`semantic`], la generación de código intermedio de
//! tres direcciones en [`ir`] y la emisión de ensamblador objetivo
//! en [`codegen`]. Por último, [`exec`] interpreta el fuente de
//! manera directa y produce la salida del programa junto a una traza
//! paso a paso.
//!
//! # Fases como funciones puras
//! Ninguna fase retiene estado entre invocaciones: cada una es una
//! función del fuente (o de la secuencia de sentencias) hacia un
//! objeto de resultado serializable que incluye el nombre de la fase
//! y una bandera de éxito. El orquestador en [`pipeline`] ejecuta
//! todas las fases sobre un mismo fuente y agrega sus resultados.
//!
//! # Limitaciones del lenguaje
//! El reconocimiento de sentencias es por línea física y no por
//! gramática anidada: los cuerpos de lazos, condicionales y funciones
//! se representan únicamente por su sentencia de encabezado. Las
//! expresiones de las fases sintáctica e intermedia se descomponen
//! sobre un solo operador binario por sentencia. Estas restricciones
//! son deliberadas y están documentadas fase por fase.

pub mod codegen;
pub mod exec;
pub mod ir;
pub mod lex;
pub mod parse;
pub mod pipeline;
pub mod recognize;
pub mod semantic;
pub mod source;
