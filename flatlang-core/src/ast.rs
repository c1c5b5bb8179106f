use std::fmt::{Display, Write};
use std::rc::Rc;

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Assign(AssignStatement),
    Call(CallStatement),
}

impl Statement {
    pub fn stages(&self) -> &[Stage] {
        match self {
            Statement::Assign(statement) => &statement.stages,
            Statement::Call(statement) => &statement.stages,
        }
    }
}

/// `name = stage > stage;`
#[derive(Debug, PartialEq, Clone)]
pub struct AssignStatement {
    pub name: Identifier,
    pub stages: Vec<Stage>,
}

/// `stage > stage;`
#[derive(Debug, PartialEq, Clone)]
pub struct CallStatement {
    pub stages: Vec<Stage>,
}

/// One `>`-delimited segment of a pipeline. Holds more than one node only
/// when the first node names a call and the rest are its arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct Stage {
    pub nodes: Vec<Node>,
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Identifier {
    pub name: Rc<str>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Identifier(Identifier),
    BooleanLiteral(bool),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    TextLiteral(String),
    InterpolatedString(Vec<StringPart>),
    ListLiteral(Vec<Node>),
    MapLiteral(Vec<(Identifier, Node)>),
    PrefixOperation(PrefixOperationKind, Box<Node>),
    InfixOperation(InfixOperationKind, Box<Node>, Box<Node>),
}

impl Node {
    pub fn is_string(&self) -> bool {
        matches!(self, Node::TextLiteral(_) | Node::InterpolatedString(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Node::BooleanLiteral(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Node::IntegerLiteral(_) | Node::FloatLiteral(_))
    }

    /// `&` and `|` combinations.
    pub fn is_logical(&self) -> bool {
        matches!(self, Node::InfixOperation(kind, _, _) if kind.is_logical())
    }

    /// `>`, `>=`, `<` and `<=` prefixes.
    pub fn is_comparison(&self) -> bool {
        matches!(self, Node::PrefixOperation(kind, _) if kind.is_comparison())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum StringPart {
    Text(String),
    Interpolation(Node),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOperationKind {
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Plus,
    Minus,
}

impl PrefixOperationKind {
    pub fn is_comparison(self) -> bool {
        !matches!(self, PrefixOperationKind::Plus | PrefixOperationKind::Minus)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOperationKind {
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl InfixOperationKind {
    pub fn is_logical(self) -> bool {
        matches!(self, InfixOperationKind::And | InfixOperationKind::Or)
    }
}

impl Display for PrefixOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            PrefixOperationKind::GreaterThan => ">",
            PrefixOperationKind::GreaterEqual => ">=",
            PrefixOperationKind::LessThan => "<",
            PrefixOperationKind::LessEqual => "<=",
            PrefixOperationKind::Plus => "+",
            PrefixOperationKind::Minus => "-",
        };
        f.write_str(operator)
    }
}

impl Display for InfixOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self {
            InfixOperationKind::And => "&",
            InfixOperationKind::Or => "|",
            InfixOperationKind::Plus => "+",
            InfixOperationKind::Minus => "-",
            InfixOperationKind::Multiply => "*",
            InfixOperationKind::Divide => "/",
        };
        f.write_str(operator)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Statement::Assign(statement) = self {
            write!(f, "{} = ", statement.name)?;
        }
        for (i, stage) in self.stages().iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Writes `text` with escapes the lexer accepts in a double quoted string.
fn write_escaped(f: &mut std::fmt::Formatter<'_>, text: &str) -> std::fmt::Result {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{7}' => f.write_str("\\a")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{b}' => f.write_str("\\v")?,
            '\u{c}' => f.write_str("\\f")?,
            '$' if chars.peek() == Some(&'{') => f.write_str("\\$")?,
            c if c.is_control() => match c as u32 {
                code @ 0..=0xFF => write!(f, "\\x{code:02x}")?,
                code @ 0x100..=0xFFFF => write!(f, "\\u{code:04x}")?,
                code => write!(f, "\\U{code:08x}")?,
            },
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Identifier(identifier) => write!(f, "{}", identifier),
            Node::BooleanLiteral(value) => write!(f, "{}", value),
            Node::IntegerLiteral(value) => write!(f, "{}", value),
            Node::FloatLiteral(value) => write!(f, "{:?}", value),
            Node::TextLiteral(text) => {
                f.write_char('"')?;
                write_escaped(f, text)?;
                f.write_char('"')
            }
            Node::InterpolatedString(parts) => {
                f.write_char('"')?;
                for part in parts {
                    match part {
                        StringPart::Text(text) => write_escaped(f, text)?,
                        StringPart::Interpolation(node) => write!(f, "${{{}}}", node)?,
                    }
                }
                f.write_char('"')
            }
            Node::ListLiteral(items) => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_char(']')
            }
            Node::MapLiteral(fields) => {
                f.write_char('{')?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_char('}')
            }
            Node::PrefixOperation(kind, operand) => write!(f, "({}{})", kind, operand),
            Node::InfixOperation(kind, left, right) => write!(f, "({} {} {})", left, kind, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> Box<Node> {
        Box::new(Node::IntegerLiteral(value))
    }

    #[test]
    fn test_render_operations() {
        let node = Node::InfixOperation(
            InfixOperationKind::Plus,
            int(40),
            Box::new(Node::InfixOperation(
                InfixOperationKind::Divide,
                Box::new(Node::InfixOperation(
                    InfixOperationKind::Multiply,
                    int(100),
                    int(32),
                )),
                int(40),
            )),
        );
        assert_eq!(node.to_string(), "(40 + ((100 * 32) / 40))");

        let node = Node::PrefixOperation(
            PrefixOperationKind::GreaterEqual,
            Box::new(Node::FloatLiteral(30.0)),
        );
        assert_eq!(node.to_string(), "(>=30.0)");
    }

    #[test]
    fn test_render_strings() {
        let text = Node::TextLiteral("say \"hi\"\n\t${x}$".to_owned());
        assert_eq!(text.to_string(), r#""say \"hi\"\n\t\${x}$""#);

        let control = Node::TextLiteral("\u{1}\u{7f}".to_owned());
        assert_eq!(control.to_string(), r#""\x01\x7f""#);

        let interpolated = Node::InterpolatedString(vec![
            StringPart::Text("this is a ".to_owned()),
            StringPart::Interpolation(Node::InfixOperation(
                InfixOperationKind::Plus,
                int(1),
                int(2),
            )),
            StringPart::Text(" test".to_owned()),
        ]);
        assert_eq!(interpolated.to_string(), r#""this is a ${(1 + 2)} test""#);
    }

    #[test]
    fn test_render_program() {
        let items = Node::Identifier(Identifier {
            name: "items".into(),
        });
        let program = Program {
            statements: vec![
                Statement::Assign(AssignStatement {
                    name: Identifier {
                        name: "hello".into(),
                    },
                    stages: vec![Stage {
                        nodes: vec![items.clone(), Node::TextLiteral("test".to_owned())],
                    }],
                }),
                Statement::Call(CallStatement {
                    stages: vec![
                        Stage {
                            nodes: vec![
                                items,
                                Node::ListLiteral(vec![
                                    Node::IntegerLiteral(1),
                                    Node::BooleanLiteral(false),
                                ]),
                            ],
                        },
                        Stage {
                            nodes: vec![Node::MapLiteral(vec![(
                                Identifier { name: "a".into() },
                                Node::FloatLiteral(0.5),
                            )])],
                        },
                    ],
                }),
            ],
        };

        assert_eq!(
            program.to_string(),
            "hello = items \"test\";\nitems [1, false] > {a: 0.5};\n"
        );
    }
}
