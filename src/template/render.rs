// src/template/render.rs
//! Rendering templates as Java compilation units.
//!
//! Filled holes are replaced by their text. Unfilled holes stay as calls to
//! a generated `hole(int)` helper that throws, so units with unreached holes
//! still compile. Conditions known to be constant are folded and the branch
//! they rule out is dropped.

use std::collections::BTreeMap;

use holesmith_choice::{InternalFault, Printer};

use super::{Expr, HoleId, Stmt, Template};

/// Substitutions for one rendered unit.
#[derive(Debug, Clone, Copy)]
pub struct Rendering<'a> {
    pub class_name: &'a str,
    /// Text of each filled hole.
    pub fills: &'a BTreeMap<HoleId, String>,
    /// Condition holes known to always take one value.
    pub conditions: &'a BTreeMap<HoleId, bool>,
    /// Iterations of the generated `main` loop.
    pub invocations: usize,
}

const INDENT: &str = "    ";
const CAUGHT: &str = "ArithmeticException | ArrayIndexOutOfBoundsException";

pub fn render_unit(template: &Template, rendering: &Rendering<'_>) -> Result<String, InternalFault> {
    let mut writer = UnitWriter {
        template,
        rendering,
        printer: Printer::new(template.arena(), template.fixed_config()),
        out: String::new(),
        depth: 0,
        needs_helper: false,
    };
    writer.unit()?;
    Ok(writer.out)
}

struct UnitWriter<'a> {
    template: &'a Template,
    rendering: &'a Rendering<'a>,
    printer: Printer<'a>,
    out: String,
    depth: usize,
    needs_helper: bool,
}

impl UnitWriter<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn unit(&mut self) -> Result<(), InternalFault> {
        let template = self.template;
        self.line(&format!("public class {} {{", self.rendering.class_name));
        self.depth += 1;
        for symbol in template.symbols() {
            self.line(&format!(
                "static {} {} = {};",
                symbol.ty,
                symbol.name,
                symbol.value.to_literal()
            ));
        }
        if !template.symbols().is_empty() {
            self.out.push('\n');
        }

        self.line("static void entry() {");
        self.depth += 1;
        self.stmts(template.body())?;
        self.depth -= 1;
        self.line("}");
        self.out.push('\n');

        self.line("public static void main(String[] args) {");
        self.depth += 1;
        self.line(&format!(
            "for (int i = 0; i < {}; i++) {{",
            self.rendering.invocations
        ));
        self.depth += 1;
        self.line("try {");
        self.line(&format!("{INDENT}entry();"));
        self.line(&format!("}} catch ({CAUGHT} e) {{"));
        self.line("}");
        self.depth -= 1;
        self.line("}");
        self.depth -= 1;
        self.line("}");

        if self.needs_helper {
            self.out.push('\n');
            self.line("private static <T> T hole(int id) {");
            self.line(&format!(
                "{INDENT}throw new IllegalStateException(\"hole \" + id + \" was not filled\");"
            ));
            self.line("}");
        }
        self.depth -= 1;
        self.line("}");
        Ok(())
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> Result<(), InternalFault> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn nested(&mut self, open: &str, body: &[Stmt], close: &str) -> Result<(), InternalFault> {
        self.line(open);
        self.depth += 1;
        self.stmts(body)?;
        self.depth -= 1;
        self.line(close);
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), InternalFault> {
        match stmt {
            Stmt::Eval(expr) => {
                let text = self.expr(*expr)?;
                self.line(&format!("{text};"));
            }
            Stmt::Assign { target, value } => {
                let text = self.expr(*value)?;
                self.line(&format!("{target} = {text};"));
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => match self.fixed_condition(*cond) {
                Some(true) => self.nested("if (true) {", then, "}")?,
                Some(false) if otherwise.is_empty() => {}
                Some(false) => self.nested("{", otherwise, "}")?,
                None => {
                    let cond = self.expr(*cond)?;
                    if otherwise.is_empty() {
                        self.nested(&format!("if ({cond}) {{"), then, "}")?;
                    } else {
                        self.nested(&format!("if ({cond}) {{"), then, "} else {")?;
                        self.depth += 1;
                        self.stmts(otherwise)?;
                        self.depth -= 1;
                        self.line("}");
                    }
                }
            },
            Stmt::While { cond, body } => match self.fixed_condition(*cond) {
                Some(true) => self.nested("while (true) {", body, "}")?,
                Some(false) => {}
                None => {
                    let cond = self.expr(*cond)?;
                    self.nested(&format!("while ({cond}) {{"), body, "}")?;
                }
            },
            Stmt::Try(body) => {
                self.nested("try {", body, &format!("}} catch ({CAUGHT} e) {{"))?;
                self.line("}");
            }
            Stmt::Block(body) => self.nested("{", body, "}")?,
        }
        Ok(())
    }

    fn fixed_condition(&self, cond: Expr) -> Option<bool> {
        match cond {
            Expr::Hole(id) => self.rendering.conditions.get(&id).copied(),
            Expr::Fixed(_) => None,
        }
    }

    fn expr(&mut self, expr: Expr) -> Result<String, InternalFault> {
        match expr {
            Expr::Hole(id) => {
                if let Some(text) = self.rendering.fills.get(&id) {
                    return Ok(text.clone());
                }
                self.needs_helper = true;
                Ok(format!("hole({id})"))
            }
            Expr::Fixed(root) => self.printer.render_bare(root),
        }
    }
}
