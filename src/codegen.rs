//! Emisión de ensamblador objetivo.
//!
//! Esta fase es una traducción por plantillas, no un selector de
//! instrucciones real: cada forma de sentencia tiene una plantilla
//! fija de instrucciones x86 de 32 bits, las variables y arreglos se
//! disponen en secciones `.data`/`.bss`, y todo programa termina con
//! la misma secuencia de salida por `sys_exit`. La lista de
//! optimizaciones del reporte es descriptiva: son etiquetas
//! condicionadas a la presencia de rasgos en el fuente, no
//! transformaciones aplicadas.

use serde::Serialize;

use crate::recognize::Statement;

/// Resultado completo de la fase de emisión.
#[derive(Clone, Debug, Serialize)]
pub struct CodegenReport {
    pub phase: &'static str,
    pub success: bool,
    pub assembly_code: String,
    pub target_architecture: &'static str,
    pub optimizations_applied: Vec<&'static str>,
    pub code_size: usize,
    pub registers_used: Vec<&'static str>,
    pub functions_generated: usize,
    pub arrays_allocated: usize,
}

macro_rules! emit {
    ($emitter:expr, $($format:tt)*) => {
        $emitter.lines.push(format!($($format)*))
    };
}

/// Emite el listado de ensamblador para la secuencia de sentencias.
pub fn generate(statements: &[Statement]) -> CodegenReport {
    let mut emitter = Emitter {
        lines: Vec::new(),
        registers: Vec::new(),
    };

    emitter.data_section(statements);
    emitter.bss_section();
    emitter.text_section(statements);
    emitter.program(statements);
    emitter.exit_sequence();

    let functions_generated = statements
        .iter()
        .filter(|s| matches!(s, Statement::FunctionDefinition { .. }))
        .count();
    let arrays_allocated = statements
        .iter()
        .filter(|s| matches!(s, Statement::ArrayDeclaration { .. }))
        .count();

    CodegenReport {
        phase: "codegen",
        success: true,
        code_size: emitter.lines.len(),
        assembly_code: emitter.lines.join("\n"),
        target_architecture: "x86",
        optimizations_applied: advisory_optimizations(statements),
        registers_used: emitter.registers,
        functions_generated,
        arrays_allocated,
    }
}

struct Emitter {
    lines: Vec<String>,
    registers: Vec<&'static str>,
}

impl Emitter {
    /// Registra un registro referenciado por alguna plantilla, sin
    /// repetidos y en orden de primera aparición.
    fn touch(&mut self, register: &'static str) {
        if !self.registers.contains(&register) {
            self.registers.push(register);
        }
    }

    fn data_section(&mut self, statements: &[Statement]) {
        emit!(self, ".section .data");

        for statement in statements {
            match statement {
                Statement::Declaration {
                    data_type, variable, ..
                } => {
                    emit!(self, "{}: .long 0    ; {} variable", variable, data_type);
                }

                Statement::ArrayDeclaration {
                    data_type,
                    variable,
                    size,
                    ..
                } => {
                    emit!(
                        self,
                        "{}: .space {}    ; {} array[{}]",
                        variable,
                        size * 4,
                        data_type,
                        size
                    );
                }

                _ => {}
            }
        }

        // Literales de cadena de las declaraciones
        let mut string_counter = 0;
        for statement in statements {
            if let Statement::Declaration { value, .. } = statement {
                if value.starts_with('"') && value.ends_with('"') {
                    emit!(self, "str{}: .asciz {}    ; String literal", string_counter, value);
                    string_counter += 1;
                }
            }
        }
    }

    fn bss_section(&mut self) {
        emit!(self, "");
        emit!(self, ".section .bss");
        emit!(self, "temp_vars: .space 100    ; Temporary variables space");
    }

    fn text_section(&mut self, statements: &[Statement]) {
        emit!(self, "");
        emit!(self, ".section .text");
        emit!(self, ".global _start");

        for statement in statements {
            if let Statement::FunctionDefinition { name, .. } = statement {
                emit!(self, "");
                emit!(self, "{}:", name);
                emit!(self, "    push ebp        ; Save base pointer");
                emit!(self, "    mov ebp, esp    ; Set up stack frame");
                emit!(self, "    ; Function body would go here");
                emit!(self, "    pop ebp         ; Restore base pointer");
                emit!(self, "    ret             ; Return to caller");
                self.touch("ebp");
                self.touch("esp");
            }
        }
    }

    fn program(&mut self, statements: &[Statement]) {
        emit!(self, "");
        emit!(self, "_start:");

        for (index, statement) in statements.iter().enumerate() {
            self.statement(statement, index);
        }
    }

    fn statement(&mut self, statement: &Statement, index: usize) {
        use Statement::*;

        match statement {
            Declaration {
                variable, value, ..
            } => self.declaration(variable, value),

            ArrayAssignment {
                variable,
                index: element,
                value,
                ..
            } => {
                emit!(self, "    ; {}[{}] = {}", variable, element, value);
                emit!(self, "    mov eax, {}       ; Load value", value);
                emit!(
                    self,
                    "    mov [{} + {}], eax  ; Store in array",
                    variable,
                    element * 4
                );
                self.touch("eax");
            }

            WhileHeader { condition, .. } => {
                emit!(self, "    ; while ({})", condition);
                emit!(self, "while_loop_{}:", index);
                emit!(self, "    ; Condition evaluation would go here");
                emit!(self, "    ; Loop body would go here");
                emit!(self, "    jmp while_loop_{}      ; Jump back to condition", index);
                emit!(self, "end_while_{}:", index);
            }

            ForHeader {
                init,
                condition,
                update,
                ..
            } => {
                emit!(self, "    ; for ({}; {}; {})", init, condition, update);
                emit!(self, "    ; Initialization: {}", init);
                emit!(self, "for_loop_{}:", index);
                emit!(self, "    ; Condition: {}", condition);
                emit!(self, "    ; Loop body would go here");
                emit!(self, "    ; Update: {}", update);
                emit!(self, "    jmp for_loop_{}        ; Jump back to condition", index);
                emit!(self, "end_for_{}:", index);
            }

            FunctionCall {
                name, arguments, ..
            } => {
                emit!(self, "    ; Call {}({})", name, arguments);
                if !arguments.is_empty() {
                    emit!(self, "    push {}       ; Push arguments", arguments);
                }
                emit!(self, "    call {}            ; Call function", name);
                if !arguments.is_empty() {
                    emit!(self, "    add esp, 4                   ; Clean up stack");
                    self.touch("esp");
                }
            }

            Print { expression, .. } => {
                emit!(self, "    ; print {}", expression);
                emit!(self, "    mov eax, 4          ; sys_write");
                emit!(self, "    mov ebx, 1          ; stdout");
                emit!(self, "    mov ecx, {}  ; message", expression);
                emit!(self, "    mov edx, 4          ; message length");
                emit!(self, "    int 0x80            ; call kernel");
                self.touch("eax");
                self.touch("ebx");
                self.touch("ecx");
                self.touch("edx");
            }

            Return { expression, .. } => {
                emit!(self, "    ; return {}", expression);
                emit!(self, "    mov eax, {}  ; Return value", expression);
                emit!(self, "    ret                          ; Return");
                self.touch("eax");
            }

            // Las definiciones de función ya se emitieron en la
            // sección de texto; el resto no tiene plantilla
            _ => {}
        }
    }

    fn declaration(&mut self, variable: &str, value: &str) {
        let binary = |value: &str, operator: char| -> Option<(String, String)> {
            if !value.contains(operator) {
                return None;
            }

            let parts: Vec<&str> = value.split(operator).collect();
            Some((
                parts[0].trim().to_owned(),
                parts.get(1).map(|part| part.trim()).unwrap_or("").to_owned(),
            ))
        };

        if let Some((left, right)) = binary(value, '+') {
            emit!(self, "    ; {} = {}", variable, value);
            emit!(self, "    mov eax, [{}]    ; Load {}", left, left);
            emit!(self, "    add eax, [{}]    ; Add {}", right, right);
            emit!(self, "    mov [{}], eax  ; Store result", variable);
            self.touch("eax");
        } else if let Some((left, right)) = binary(value, '-') {
            emit!(self, "    ; {} = {}", variable, value);
            emit!(self, "    mov eax, [{}]    ; Load {}", left, left);
            emit!(self, "    sub eax, [{}]    ; Subtract {}", right, right);
            emit!(self, "    mov [{}], eax  ; Store result", variable);
            self.touch("eax");
        } else if let Some((left, right)) = binary(value, '*') {
            emit!(self, "    ; {} = {}", variable, value);
            emit!(self, "    mov eax, [{}]    ; Load {}", left, left);
            emit!(self, "    imul eax, [{}]   ; Multiply by {}", right, right);
            emit!(self, "    mov [{}], eax  ; Store result", variable);
            self.touch("eax");
        } else if crate::source::is_numeric(value) {
            emit!(self, "    ; {} = {}", variable, value);
            emit!(self, "    mov dword ptr [{}], {}", variable, value);
        }
    }

    fn exit_sequence(&mut self) {
        emit!(self, "");
        emit!(self, "    ; Program exit");
        emit!(self, "    mov eax, 1          ; sys_exit");
        emit!(self, "    xor ebx, ebx        ; exit status");
        emit!(self, "    int 0x80            ; call kernel");
        self.touch("eax");
        self.touch("ebx");
    }
}

/// Lista descriptiva de optimizaciones, condicionada a los rasgos
/// presentes en el fuente más dos etiquetas constantes.
fn advisory_optimizations(statements: &[Statement]) -> Vec<&'static str> {
    use Statement::*;

    let mut optimizations = Vec::new();

    if statements.iter().any(|s| matches!(s, ArrayDeclaration { .. })) {
        optimizations.push("Array bounds checking");
    }
    if statements
        .iter()
        .any(|s| matches!(s, FunctionDefinition { .. }))
    {
        optimizations.push("Function inlining opportunities");
    }
    if statements
        .iter()
        .any(|s| matches!(s, WhileHeader { .. } | ForHeader { .. }))
    {
        optimizations.push("Loop optimization");
    }

    optimizations.push("Register allocation");
    optimizations.push("Dead code elimination");

    optimizations
}
