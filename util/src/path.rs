use std::{collections::VecDeque, hash::Hash};

use crate::HashSet;

/// Breadth-first distance map over a graph given by a neighbors function.
///
/// Yields every reachable node once with its step count from the nearest
/// start, in nondecreasing distance order.
pub fn dijkstra_map<'a, T, I>(
    mut neighbors: impl FnMut(&T) -> I + 'a,
    starts: impl IntoIterator<Item = T>,
) -> impl Iterator<Item = (T, usize)> + 'a
where
    T: Clone + Eq + Hash + 'a,
    I: IntoIterator<Item = T>,
{
    let mut edge: VecDeque<(T, usize)> =
        starts.into_iter().map(|s| (s, 0)).collect();
    let mut seen = HashSet::default();

    std::iter::from_fn(move || {
        // FIFO queue, first pop of a node is at its shortest distance.
        while let Some((node, len)) = edge.pop_front() {
            if seen.insert(node.clone()) {
                for n in neighbors(&node) {
                    edge.push_back((n, len + 1));
                }
                return Some((node, len));
            }
        }
        None
    })
}

/// Combinator for cutting a distance map off at `n` steps, exclusive.
pub fn within_range<T>(n: usize) -> impl FnMut(&(T, usize)) -> bool {
    move |&(_, k)| k < n
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn chain_depths() {
        // 0 - 1 - 2 - 3 - 4
        let neighbors = |&i: &i32| {
            [i - 1, i + 1].into_iter().filter(|n| (0..5).contains(n))
        };
        let near: Vec<(i32, usize)> = dijkstra_map(neighbors, [2])
            .take_while(within_range(2))
            .collect();
        assert_eq!(near, vec![(2, 0), (1, 1), (3, 1)]);

        let all: Vec<(i32, usize)> = dijkstra_map(neighbors, [0]).collect();
        assert_eq!(all.len(), 5);
        assert_eq!(all.last(), Some(&(4, 4)));
    }
}
