use quickcheck::{Arbitrary, Gen};

use rand::distributions::{Distribution, Standard};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

use fxhash::FxHashSet;

/// Compound statements never nest deeper than this.
const MAX_NESTING: usize = 3;
/// Procedures and functions never nest deeper than this.
const MAX_ROUTINE_NESTING: usize = 2;

#[derive(Debug)]
struct IdentDistribution;

impl Distribution<char> for IdentDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        const RANGE: u32 = 26 + 26;
        const VALID_ASCII_IDENT_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                abcdefghijklmnopqrstuvwxyz";
        loop {
            let var = rng.next_u32() >> (32 - 6);
            if var < RANGE {
                return VALID_ASCII_IDENT_CHARS[var as usize] as char;
            }
        }
    }
}

/// The value types a generated declaration can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuzzType {
    Integer,
    Real,
    Str,
    Boolean,
}

impl FuzzType {
    fn keyword(self) -> &'static str {
        match self {
            FuzzType::Integer => "integer",
            FuzzType::Real => "real",
            FuzzType::Str => "string",
            FuzzType::Boolean => "boolean",
        }
    }

    fn is_numeric(self) -> bool {
        self == FuzzType::Integer || self == FuzzType::Real
    }
}

impl Distribution<FuzzType> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> FuzzType {
        match rng.gen_range(0, 4) {
            0 => FuzzType::Integer,
            1 => FuzzType::Real,
            2 => FuzzType::Str,
            3 => FuzzType::Boolean,
            _ => unreachable!(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum FuzzStmtChoice {
    // `x := expr`
    Assign,
    // A procedure call
    Call,
    If,
    While,
    // A bare loop with an exit
    Loop,
    For,
    Read,
    Write,
    Null,
}

impl FuzzStmtChoice {
    fn is_compound(&self) -> bool {
        matches!(
            self,
            FuzzStmtChoice::If | FuzzStmtChoice::While | FuzzStmtChoice::Loop | FuzzStmtChoice::For
        )
    }
}

/// Allow randomly generating a `FuzzStmtChoice` across a standard distribution
impl Distribution<FuzzStmtChoice> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> FuzzStmtChoice {
        match rng.gen_range(0, 9) {
            0 => FuzzStmtChoice::Assign,
            1 => FuzzStmtChoice::Call,
            2 => FuzzStmtChoice::If,
            3 => FuzzStmtChoice::While,
            4 => FuzzStmtChoice::Loop,
            5 => FuzzStmtChoice::For,
            6 => FuzzStmtChoice::Read,
            7 => FuzzStmtChoice::Write,
            8 => FuzzStmtChoice::Null,
            _ => unreachable!(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct CodeFuzzerRestrictions {
    stmt_restrictions: Option<Vec<FuzzStmtChoice>>,
}

impl CodeFuzzerRestrictions {
    pub fn stmts(&self) -> &Option<Vec<FuzzStmtChoice>> {
        &self.stmt_restrictions
    }

    pub fn set_stmt_restrictions(&mut self, restrictions: Vec<FuzzStmtChoice>) {
        self.stmt_restrictions = Some(restrictions);
    }
}

/// A name the generated code may refer to.
#[derive(Clone, Debug)]
struct Binding {
    name: String,
    ty: FuzzType,
    /// Variables and reference parameters. Constants, value parameters and
    /// loop variables are read-only.
    assignable: bool,
}

#[derive(Clone, Debug)]
struct Routine {
    name: String,
    /// Type of each parameter and whether it is passed by reference
    params: Vec<(FuzzType, bool)>,
    returns: Option<FuzzType>,
}

#[derive(Default, Clone, Debug)]
struct FuzzScope {
    bindings: Vec<Binding>,
    routines: Vec<Routine>,
}

/// Generates random well-formed Lille programs
#[derive(Default, Clone, Debug)]
pub struct CodeFuzzer {
    /// The code that has already been generated
    /// for this instance.
    code: String,
    /// In some instances we want to restrict which kind
    /// of code we are generating. `CodeFuzzerRestrictions`
    /// encapsulates that state and provides an API for interacting with it
    restrictions: CodeFuzzerRestrictions,
    /// Set of already used identifiers, ensures we only generate unique ident names
    used_idents: FxHashSet<String>,
    /// Names visible at the current point, innermost scope last
    scopes: Vec<FuzzScope>,
    /// Tracking horizontal offset for spaces/tabs
    tab_depth: usize,
    /// How many compound statements enclose the current one
    nesting: usize,
}

/// This lets us use quickcheck for tests that rely on
/// parsing code samples
impl Arbitrary for CodeFuzzer {
    fn arbitrary<G: Gen>(gen: &mut G) -> Self {
        let mut fuzz = CodeFuzzer::default();
        let line_count = thread_rng().gen_range(1, gen.size().max(2).min(12));
        fuzz.gen_program(line_count);
        fuzz
    }
}

impl CodeFuzzer {
    /// Get the code that has been generated
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Restrict the fuzzer to some subset of statement choices
    pub fn restrict_stmts(&mut self, restrictions: Vec<FuzzStmtChoice>) {
        self.restrictions.set_stmt_restrictions(restrictions);
    }

    /// Generate a whole program whose main block has `line_count` statements.
    pub fn gen_program(&mut self, line_count: usize) {
        let name = self.gen_ident();
        self.commit_seq(vec!["program ", &name, " is\n"]);
        self.scopes.push(FuzzScope::default());
        for (builtin, param, returns) in &[
            ("int2real", FuzzType::Integer, FuzzType::Real),
            ("real2int", FuzzType::Real, FuzzType::Integer),
            ("int2string", FuzzType::Integer, FuzzType::Str),
            ("real2string", FuzzType::Real, FuzzType::Str),
        ] {
            self.current_scope().routines.push(Routine {
                name: builtin.to_string(),
                params: vec![(*param, false)],
                returns: Some(*returns),
            });
        }
        self.gen_block(&name, 0, None);
        self.scopes.pop();
    }

    /// Generate `line_count` number of random statements
    pub fn gen_lines(&mut self, line_count: usize) {
        for _ in 0..line_count.max(1) {
            self.gen_stmt();
        }
    }

    /// Randomly choose the type of statement to generate,
    /// respecting any restrictions that have been enabled.
    fn choose_stmt_kind(&self) -> FuzzStmtChoice {
        let kind = match self.restrictions.stmts() {
            Some(restrictions) => restrictions
                .choose(&mut thread_rng())
                .cloned()
                .unwrap_or(FuzzStmtChoice::Null),
            None => rand::random(),
        };
        if kind.is_compound() && self.nesting >= MAX_NESTING {
            FuzzStmtChoice::Null
        } else {
            kind
        }
    }

    /// Push some code into the `self.code`.
    fn commit(&mut self, code: &str) {
        self.code.push_str(code);
    }

    fn commit_seq(&mut self, code_seq: Vec<&str>) {
        for code in code_seq {
            self.commit(code);
        }
    }

    /// Commit one indented line.
    fn commit_line(&mut self, line: &str) {
        for _ in 0..self.tab_depth {
            self.code.push_str("    ");
        }
        self.code.push_str(line);
        self.code.push('\n');
    }

    fn current_scope(&mut self) -> &mut FuzzScope {
        self.scopes.last_mut().expect("generation happens inside a scope")
    }

    fn bind(&mut self, name: &str, ty: FuzzType, assignable: bool) {
        self.current_scope().bindings.push(Binding {
            name: name.to_string(),
            ty,
            assignable,
        });
    }

    fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.scopes.iter().flat_map(|scope| scope.bindings.iter())
    }

    fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.scopes.iter().flat_map(|scope| scope.routines.iter())
    }

    fn pick_binding(&self, ty: FuzzType, assignable: bool) -> Option<Binding> {
        let candidates: Vec<_> = self
            .bindings()
            .filter(|binding| binding.ty == ty && (binding.assignable || !assignable))
            .collect();
        candidates.choose(&mut thread_rng()).map(|binding| (*binding).clone())
    }

    fn pick_function(&self, ty: FuzzType) -> Option<Routine> {
        let candidates: Vec<_> = self
            .routines()
            .filter(|routine| routine.returns == Some(ty))
            .collect();
        candidates.choose(&mut thread_rng()).map(|routine| (*routine).clone())
    }

    /// Generate a random identifier. A trailing digit keeps it clear of
    /// the keywords and the builtin names.
    fn gen_ident(&mut self) -> String {
        let mut rng = thread_rng();
        loop {
            let letters: String = (&mut rng).sample_iter(&IdentDistribution).take(3).collect();
            let ident = format!("{}{}", letters, rng.gen_range(0, 10));
            if self.used_idents.insert(ident.to_uppercase()) {
                return ident;
            }
        }
    }

    fn gen_literal(ty: FuzzType) -> String {
        let mut rng = thread_rng();
        match ty {
            FuzzType::Integer => format!("{}", rng.gen_range(0, 1000)),
            FuzzType::Real => {
                if rng.gen_bool(0.2) {
                    format!("{}.{}E{}", rng.gen_range(0, 10), rng.gen_range(0, 100), rng.gen_range(0, 5))
                } else {
                    format!("{}.{}", rng.gen_range(0, 1000), rng.gen_range(0, 100))
                }
            }
            FuzzType::Str => {
                let text: String = rng.sample_iter(&IdentDistribution).take(5).collect();
                format!("\"{}\"", text)
            }
            FuzzType::Boolean => String::from(if rng.gen() { "true" } else { "false" }),
        }
    }

    /// block ::= { declaration } "begin" stmt_list "end" IDENT ";"
    fn gen_block(&mut self, name: &str, routine_depth: usize, returns: Option<FuzzType>) {
        self.scopes.push(FuzzScope::default());
        self.tab_depth += 1;
        self.gen_declarations(routine_depth);
        self.tab_depth -= 1;
        self.commit_line("begin");
        self.tab_depth += 1;
        self.gen_lines(thread_rng().gen_range(1, 4));
        if let Some(ty) = returns {
            let value = self.gen_return_expr(ty);
            self.commit_line(&format!("return {};", value));
        }
        self.tab_depth -= 1;
        self.commit_line(&format!("end {};", name));
        self.scopes.pop();
    }

    fn gen_declarations(&mut self, routine_depth: usize) {
        let mut rng = thread_rng();
        for _ in 0..rng.gen_range(0, 4) {
            self.gen_variables();
        }
        if routine_depth < MAX_ROUTINE_NESTING {
            for _ in 0..rng.gen_range(0, 3) {
                self.gen_routine(routine_depth + 1);
            }
        }
    }

    fn gen_variables(&mut self) {
        let mut rng = thread_rng();
        let ty: FuzzType = rand::random();
        let names: Vec<String> = (0..rng.gen_range(1, 3)).map(|_| self.gen_ident()).collect();
        let constant = rng.gen_bool(0.3);
        let mut line = format!("{} : ", names.join(", "));
        if constant {
            line.push_str("constant ");
        }
        line.push_str(ty.keyword());
        if constant || rng.gen_bool(0.2) {
            line.push_str(" := ");
            line.push_str(&CodeFuzzer::gen_literal(ty));
        }
        line.push(';');
        self.commit_line(&line);
        for name in &names {
            self.bind(name, ty, !constant);
        }
    }

    /// A procedure or function with its own parameter and block scopes.
    /// The routine becomes callable only after its body.
    fn gen_routine(&mut self, routine_depth: usize) {
        let mut rng = thread_rng();
        let name = self.gen_ident();
        let returns = if rng.gen() {
            Some(rand::random::<FuzzType>())
        } else {
            None
        };
        self.scopes.push(FuzzScope::default());
        let mut params = vec![];
        let mut groups = vec![];
        for _ in 0..rng.gen_range(0, 4) {
            let param = self.gen_ident();
            let ty: FuzzType = rand::random();
            let by_ref = rng.gen();
            groups.push(format!(
                "{} : {} {}",
                param,
                if by_ref { "ref" } else { "value" },
                ty.keyword()
            ));
            self.bind(&param, ty, by_ref);
            params.push((ty, by_ref));
        }
        let mut header = format!(
            "{} {}",
            if returns.is_some() { "function" } else { "procedure" },
            name
        );
        if !groups.is_empty() {
            header.push_str(&format!("({})", groups.join("; ")));
        }
        if let Some(ty) = returns {
            header.push_str(" return ");
            header.push_str(ty.keyword());
        }
        header.push_str(" is");
        self.commit_line(&header);
        self.gen_block(&name, routine_depth, returns);
        self.scopes.pop();
        self.current_scope().routines.push(Routine {
            name,
            params,
            returns,
        });
    }

    /// A call to `routine` with correctly typed arguments.
    fn gen_call(&mut self, routine: &Routine) -> String {
        if routine.params.is_empty() {
            return routine.name.clone();
        }
        let args: Vec<String> = routine
            .params
            .iter()
            .map(|(ty, by_ref)| match self.pick_binding(*ty, *by_ref) {
                Some(binding) if *by_ref || thread_rng().gen() => binding.name,
                _ => CodeFuzzer::gen_literal(*ty),
            })
            .collect();
        format!("{}({})", routine.name, args.join(", "))
    }

    /// An identifier, function call or literal of type `ty`.
    fn gen_operand(&mut self, ty: FuzzType) -> String {
        match thread_rng().gen_range(0, 3) {
            0 => {
                if let Some(binding) = self.pick_binding(ty, false) {
                    return binding.name;
                }
            }
            1 => {
                if let Some(function) = self.pick_function(ty) {
                    return self.gen_call(&function);
                }
            }
            _ => {}
        }
        CodeFuzzer::gen_literal(ty)
    }

    /// The right-hand side of an assignment to a `ty` target.
    fn gen_expr(&mut self, ty: FuzzType) -> String {
        let mut rng = thread_rng();
        match ty {
            FuzzType::Boolean => {
                let operand = self.gen_operand(ty);
                if rng.gen_bool(0.3) {
                    format!("not {}", operand)
                } else {
                    operand
                }
            }
            FuzzType::Str => self.gen_chain(ty, &["&"]),
            _ => {
                if rng.gen_bool(0.2) {
                    let inner = self.gen_chain(ty, &["+", "-", "*", "/"]);
                    let right = self.gen_operand(ty);
                    format!("({}) * {}", inner, right)
                } else {
                    self.gen_chain(ty, &["+", "-", "*", "/"])
                }
            }
        }
    }

    /// The value of a `return` from a `ty` function.
    fn gen_return_expr(&mut self, ty: FuzzType) -> String {
        match ty {
            FuzzType::Boolean => self.gen_operand(ty),
            FuzzType::Str => self.gen_chain(ty, &["&"]),
            _ => self.gen_chain(ty, &["+", "-", "*"]),
        }
    }

    /// Operands of type `ty` joined by operators drawn from `operators`.
    fn gen_chain(&mut self, ty: FuzzType, operators: &[&str]) -> String {
        let mut rng = thread_rng();
        let mut expr = self.gen_operand(ty);
        for _ in 0..rng.gen_range(0, 3) {
            let operator = operators.choose(&mut rng).unwrap_or(&"+");
            let operand = self.gen_operand(ty);
            expr = format!("{} {} {}", expr, operator, operand);
        }
        expr
    }

    /// relation { ( "and" | "or" ) relation }
    fn gen_condition(&mut self) -> String {
        let mut rng = thread_rng();
        let mut condition = self.gen_relation();
        for _ in 0..rng.gen_range(0, 2) {
            let joiner = if rng.gen() { "and" } else { "or" };
            let relation = self.gen_relation();
            condition = format!("{} {} {}", condition, joiner, relation);
        }
        condition
    }

    fn gen_relation(&mut self) -> String {
        const RELOPS: &[&str] = &["=", "<>", "<", "<=", ">", ">="];
        let mut rng = thread_rng();
        let ty: FuzzType = rand::random();
        if ty == FuzzType::Boolean && rng.gen() {
            return self.gen_operand(ty);
        }
        let left = self.gen_operand(ty);
        let right = self.gen_operand(ty);
        format!("{} {} {}", left, RELOPS.choose(&mut rng).unwrap_or(&"="), right)
    }

    /// Statements nested one level deeper, in their own indentation.
    fn gen_nested_lines(&mut self) {
        self.tab_depth += 1;
        self.nesting += 1;
        self.gen_lines(thread_rng().gen_range(1, 4));
        self.nesting -= 1;
        self.tab_depth -= 1;
    }

    /// Generate a single statement
    fn gen_stmt(&mut self) {
        use FuzzStmtChoice::{Assign, Call, For, If, Loop, Null, Read, While, Write};
        let mut rng = thread_rng();
        match self.choose_stmt_kind() {
            Assign => {
                let ty: FuzzType = rand::random();
                match self.pick_binding(ty, true) {
                    Some(target) => {
                        let value = self.gen_expr(ty);
                        self.commit_line(&format!("{} := {};", target.name, value));
                    }
                    None => self.commit_line("null;"),
                }
            }
            Call => {
                let procedures: Vec<_> = self
                    .routines()
                    .filter(|routine| routine.returns.is_none())
                    .cloned()
                    .collect();
                match procedures.choose(&mut rng) {
                    Some(procedure) => {
                        let call = self.gen_call(procedure);
                        self.commit_line(&format!("{};", call));
                    }
                    None => self.commit_line("null;"),
                }
            }
            If => {
                let condition = self.gen_condition();
                self.commit_line(&format!("if {} then", condition));
                self.gen_nested_lines();
                if rng.gen_bool(0.3) {
                    let condition = self.gen_condition();
                    self.commit_line(&format!("elsif {} then", condition));
                    self.gen_nested_lines();
                }
                if rng.gen() {
                    self.commit_line("else");
                    self.gen_nested_lines();
                }
                self.commit_line("end if;");
            }
            While => {
                let condition = self.gen_condition();
                self.commit_line(&format!("while {} loop", condition));
                self.gen_nested_lines();
                self.commit_line("end loop;");
            }
            Loop => {
                self.commit_line("loop");
                self.gen_nested_lines();
                let left = self.gen_operand(FuzzType::Integer);
                let right = self.gen_operand(FuzzType::Integer);
                self.tab_depth += 1;
                self.commit_line(&format!("exit when {} >= {};", left, right));
                self.tab_depth -= 1;
                self.commit_line("end loop;");
            }
            For => {
                let variable = self.gen_ident();
                let low = self.gen_operand(FuzzType::Integer);
                let high = self.gen_operand(FuzzType::Integer);
                let reverse = if rng.gen() { "reverse " } else { "" };
                self.commit_line(&format!("for {} in {}{}..{} loop", variable, reverse, low, high));
                self.scopes.push(FuzzScope::default());
                self.bind(&variable, FuzzType::Integer, false);
                self.gen_nested_lines();
                self.scopes.pop();
                self.commit_line("end loop;");
            }
            Read => {
                let ty: FuzzType = rand::random();
                match self.pick_binding(ty, true) {
                    Some(target) => self.commit_line(&format!("read({});", target.name)),
                    None => self.commit_line("null;"),
                }
            }
            Write => {
                let keyword = if rng.gen() { "write" } else { "writeln" };
                let items: Vec<String> = (0..rng.gen_range(0, 4))
                    .map(|_| {
                        let ty: FuzzType = rand::random();
                        match self.pick_binding(ty, false) {
                            Some(binding) if rng.gen() => binding.name,
                            _ => CodeFuzzer::gen_literal(ty),
                        }
                    })
                    .collect();
                if items.is_empty() {
                    self.commit_line(&format!("{};", keyword));
                } else {
                    let separator = if rng.gen() { " & " } else { ", " };
                    self.commit_line(&format!("{}({});", keyword, items.join(separator)));
                }
            }
            Null => self.commit_line("null;"),
        }
    }
}
