use fnv::FnvHashMap;

use crate::{ast::{ExprId, Stmt}, LoxError};

mod resolver;

pub use resolver::{ClassKind, FunctionKind, Resolver};

/// The resolver's depth table: for every statically resolved variable access,
/// the number of environments which must be walked outwards from the one in
/// effect at the access to reach the environment owning the variable.
///
/// Accesses with no entry refer to globals.
pub type Locals = FnvHashMap<ExprId, usize>;

/// Resolves every variable access in a program, returning the depth table or
/// every diagnostic found along the way.
pub fn resolve(stmts: &[Stmt]) -> Result<Locals, Vec<LoxError>> {
    let mut resolver = Resolver::default();
    resolver.resolve(stmts);
    resolver.finish()
}
