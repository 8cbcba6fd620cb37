/// A syntax tree node. The interpreter dispatches over this with an
/// exhaustive match, so adding a variant is a compile-time event.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    TopLevel(Vec<Node>),
    ModuleDef(String),
    UseStmt(String),
    VarDef { name: String, value: Box<Node> },
    FixedVarDef { name: String, value: Box<Node> },
    VarAssignment { name: String, value: Box<Node> },
    Variable(String),
    FuncDef {
        name: String,
        params: Vec<Node>,
        body: Vec<Node>,
    },
    FuncCall { name: String, args: Box<Node> },
    BuiltinFuncCall { name: String, args: Box<Node> },
    ArgList(Vec<Node>),
    Block(Vec<Node>),
    GroupedExpr(Vec<Node>),
    BinaryExpr(String),
    Op(String),
    String(String),
    Number(f64),
    ReturnStmt(Box<Node>),
    NoOp,
}

impl Node {
    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::TopLevel(_) => "TopLevel",
            Node::ModuleDef(_) => "ModuleDef",
            Node::UseStmt(_) => "UseStmt",
            Node::VarDef { .. } => "VarDef",
            Node::FixedVarDef { .. } => "FixedVarDef",
            Node::VarAssignment { .. } => "VarAssignment",
            Node::Variable(_) => "Variable",
            Node::FuncDef { .. } => "FuncDef",
            Node::FuncCall { .. } => "FuncCall",
            Node::BuiltinFuncCall { .. } => "BuiltinFuncCall",
            Node::ArgList(_) => "ArgList",
            Node::Block(_) => "Block",
            Node::GroupedExpr(_) => "GroupedExpr",
            Node::BinaryExpr(_) => "BinaryExpr",
            Node::Op(_) => "Op",
            Node::String(_) => "String",
            Node::Number(_) => "Number",
            Node::ReturnStmt(_) => "ReturnStmt",
            Node::NoOp => "NoOp",
        }
    }
}
