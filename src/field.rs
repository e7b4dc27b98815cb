use crate::grid::Grid;
use rayon::prelude::*;
use std::sync::OnceLock;

const PAR_THRESHOLD_DEFAULT: usize = 262_144;
const PAR_MIN_WORK_PER_THREAD: usize = 4096;

fn parallel_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(|| {
        std::env::var("SIM_PAR_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(PAR_THRESHOLD_DEFAULT)
    })
}

fn should_parallel(len: usize) -> bool {
    if len < parallel_threshold() {
        return false;
    }
    let threads = rayon::current_num_threads().max(1);
    len / threads >= PAR_MIN_WORK_PER_THREAD
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    grid: Grid,
    data: Vec<f32>,
}

impl Field {
    pub fn new(grid: Grid) -> Self {
        let data = vec![0.0; grid.size()];
        Self { grid, data }
    }

    pub fn from_fn(grid: Grid, f: impl Fn(usize, usize) -> f32) -> Self {
        let n = grid.n();
        let data = (0..grid.size())
            .map(|i| {
                let x = i % n;
                let y = i / n;
                f(x, y)
            })
            .collect();
        Self { grid, data }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn get(&self, x: i32, y: i32) -> f32 {
        self.data[self.grid.index(x, y)]
    }

    pub fn set(&mut self, x: i32, y: i32, value: f32) {
        let idx = self.grid.index(x, y);
        self.data[idx] = value;
    }

    pub fn add(&mut self, x: i32, y: i32, amount: f32) {
        let idx = self.grid.index(x, y);
        self.data[idx] += amount;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(self.grid, other.grid, "field grid mismatch");
        self.data.copy_from_slice(&other.data);
    }

    pub fn update(&mut self, f: impl Fn(f32) -> f32) {
        for value in &mut self.data {
            *value = f(*value);
        }
    }

    pub fn update_with_index(&mut self, f: impl Fn(usize, usize, f32) -> f32 + Sync) {
        let n = self.grid.n();
        if should_parallel(self.data.len()) {
            self.data.par_iter_mut().enumerate().for_each(|(i, value)| {
                let x = i % n;
                let y = i / n;
                *value = f(x, y, *value);
            });
        } else {
            for (i, value) in self.data.iter_mut().enumerate() {
                let x = i % n;
                let y = i / n;
                *value = f(x, y, *value);
            }
        }
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, value| acc.max(value.abs()))
    }
}
