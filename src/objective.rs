use crate::builder::AssignmentVar;
use crate::catalog::Catalog;
use crate::model::LinearExpr;

/// `Σ x[f,a,t] · cost[f][a]` over exactly the assignment variables that exist.
///
/// Cost depends only on the flight and aircraft, so every start slot of a
/// pair carries the same coefficient.
pub fn build_objective(catalog: &Catalog, assignments: &[AssignmentVar]) -> LinearExpr {
    assignments.iter().fold(LinearExpr::new(), |expr, x| {
        let cost = catalog.flights()[x.flight].cost(x.aircraft);
        expr.with_term(x.var, cost)
    })
}
