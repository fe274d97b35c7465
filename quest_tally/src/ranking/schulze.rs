use log::debug;

use super::*;

/// Beatpath counting over dense matrices indexed by option.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchulzeCounter;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct OptionId(usize);

#[derive(Eq, PartialEq, Debug, Clone)]
struct Matrix {
    size: usize,
    cells: Vec<Vec<u32>>,
}

impl Matrix {
    fn new(size: usize) -> Matrix {
        Matrix {
            size,
            cells: vec![vec![0; size]; size],
        }
    }

    fn get(&self, i: OptionId, j: OptionId) -> u32 {
        self.cells[i.0][j.0]
    }

    fn set(&mut self, i: OptionId, j: OptionId, value: u32) {
        self.cells[i.0][j.0] = value;
    }

    fn ids(&self) -> impl Iterator<Item = OptionId> {
        (0..self.size).map(OptionId)
    }
}

impl RankedCounter for SchulzeCounter {
    fn count(&self, votes: &RankedVotes) -> Vec<RankedResult> {
        let options: Vec<&String> = votes.keys().collect();
        if options.len() <= 1 {
            return to_results(options.into_iter().map(|o| (o.clone(), 0.0)).collect());
        }

        let preferences = pairwise_preferences(votes, &options);
        let strongest = strongest_paths(&preferences);
        let winning = winning_paths(&strongest);

        let mut scored: Vec<(&String, u32, u32, f64)> = winning
            .ids()
            .map(|i| {
                let outgoing: Vec<u32> = winning.ids().map(|j| winning.get(i, j)).collect();
                (
                    options[i.0],
                    outgoing.iter().filter(|v| **v > 0).count() as u32,
                    outgoing.iter().sum(),
                    borda_of(votes, options[i.0]),
                )
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| desc(a.3, b.3))
                .then_with(|| a.0.cmp(b.0))
        });
        debug!("SchulzeCounter::count: {:?}", scored);
        to_results(
            scored
                .into_iter()
                .map(|(option, wins, _, _)| (option.clone(), wins as f64))
                .collect(),
        )
    }
}

// Cell (i, j): voters who rank i at least as well as j. An option missing
// from a ballot ranks below every option on it.
fn pairwise_preferences(votes: &RankedVotes, options: &[&String]) -> Matrix {
    let mut d = Matrix::new(options.len());
    for ranks in voter_rankings(votes).values() {
        let ballot: Vec<Option<u32>> = options
            .iter()
            .map(|o| {
                ranks
                    .iter()
                    .find(|(option, _)| option == *o)
                    .map(|(_, rank)| *rank)
            })
            .collect();
        for i in d.ids() {
            for j in d.ids() {
                if i == j {
                    continue;
                }
                let prefers = match (ballot[i.0], ballot[j.0]) {
                    (Some(a), Some(b)) => a <= b,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if prefers {
                    d.set(i, j, d.get(i, j) + 1);
                }
            }
        }
    }
    d
}

fn strongest_paths(d: &Matrix) -> Matrix {
    let mut p = Matrix::new(d.size);
    for i in d.ids() {
        for j in d.ids() {
            if i != j && d.get(i, j) > d.get(j, i) {
                p.set(i, j, d.get(i, j));
            }
        }
    }
    for i in d.ids() {
        for j in d.ids() {
            if i == j {
                continue;
            }
            for k in d.ids() {
                if k == i || k == j {
                    continue;
                }
                let through = p.get(j, i).min(p.get(i, k));
                if through > p.get(j, k) {
                    p.set(j, k, through);
                }
            }
        }
    }
    p
}

fn winning_paths(p: &Matrix) -> Matrix {
    let mut w = Matrix::new(p.size);
    for i in p.ids() {
        for j in p.ids() {
            if i != j && p.get(i, j) >= p.get(j, i) {
                w.set(i, j, p.get(i, j));
            }
        }
    }
    w
}
