//! Sum-of-products → product-of-sums guard simplification.
//!
//! The general transformation is NP-hard; this applies the three targeted
//! steps the structurizer needs: factoring of terms common to every
//! product, cartesian expansion of the residue, and removal of vacuously
//! true sums. Terms compare by id — condition expressions built from the
//! same IR value share one id, so no structural matching is needed.

use super::{AstPool, ExprId};

/// Convert a reaching condition in DNF (disjunction of products) into a
/// list of sums to be conjoined, ordered outermost first.
///
/// `true` is the empty list: a condition holding an empty product is
/// already vacuously true and yields no guards. Callers never pass an
/// empty disjunction (every recorded node has at least one path product).
pub fn dnf_to_cnf(pool: &AstPool, dnf: &[Vec<ExprId>]) -> Vec<Vec<ExprId>> {
    debug_assert!(!dnf.is_empty());
    if dnf.iter().any(|product| product.is_empty()) {
        return Vec::new();
    }

    // Factor out terms present in every product; they become the leading
    // single-term sums.
    let mut products: Vec<Vec<ExprId>> = dnf.to_vec();
    let mut out: Vec<Vec<ExprId>> = Vec::new();
    for term in products[0].clone() {
        if products.iter().all(|product| product.contains(&term)) {
            out.push(vec![term]);
            for product in &mut products {
                product.retain(|&t| t != term);
            }
        }
    }

    // A product emptied by factoring makes the residue vacuously true.
    if products.iter().any(|product| product.is_empty()) {
        return out;
    }

    // Cartesian expansion: one term from each product per emitted sum.
    let mut sums: Vec<Vec<ExprId>> = vec![Vec::new()];
    for product in &products {
        let mut next = Vec::with_capacity(sums.len() * product.len());
        for sum in &sums {
            for &term in product {
                let mut grown = sum.clone();
                if !grown.contains(&term) {
                    grown.push(term);
                }
                next.push(grown);
            }
        }
        sums = next;
    }

    // A sum containing a term and its negation is true; a true factor
    // contributes nothing to the conjunction.
    sums.retain(|sum| !has_complementary_pair(pool, sum));
    out.extend(sums);
    out
}

fn has_complementary_pair(pool: &AstPool, sum: &[ExprId]) -> bool {
    sum.iter()
        .any(|&a| sum.iter().any(|&b| pool.negates(a, b)))
}
