use crate::array::Element;
use crate::autograd::var::{Var, VarData};
use std::cell::RefCell;
use std::collections::HashSet;

/// Stable identity of a graph node (address of its shared cell).
pub(crate) type NodeId<T> = *const RefCell<VarData<T>>;

/// Recursively builds a topological sort of the graph ending at `node`.
/// Inputs always appear before the nodes computed from them.
fn build_topo<T: Element>(node: &Var<T>, visited: &mut HashSet<NodeId<T>>, sorted: &mut Vec<Var<T>>) {
    if !visited.insert(node.node_id()) {
        return;
    }
    if let Some(grad_fn) = node.grad_fn() {
        for input in grad_fn.inputs() {
            build_topo(&input, visited, sorted);
        }
    }
    sorted.push(node.clone());
}

/// Nodes reachable from `root`, inputs first and `root` last.
pub(crate) fn topological_sort<T: Element>(root: &Var<T>) -> Vec<Var<T>> {
    let mut visited = HashSet::new();
    let mut sorted = Vec::new();
    build_topo(root, &mut visited, &mut sorted);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;

    #[test]
    fn test_topological_sort_visits_shared_nodes_once() {
        let x = Var::leaf(Array::from_vec(vec![1.0, 2.0]));
        let y = x.add(&x).unwrap();
        let z = y.mul(&x).unwrap();
        let loss = z.sum().unwrap();

        let sorted = topological_sort(&loss);
        assert_eq!(sorted.len(), 4);
        assert_eq!(sorted[0].node_id(), x.node_id());
        assert_eq!(sorted[3].node_id(), loss.node_id());
    }

    #[test]
    fn test_leaf_sorts_to_itself() {
        let x = Var::constant(Array::scalar(3.0));
        let sorted = topological_sort(&x);
        assert_eq!(sorted.len(), 1);
    }
}
