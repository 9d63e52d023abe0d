//! Figure payloads handed to an external renderer.
//!
//! Nothing here draws. A `Renderer` receives fully computed arrays grouped into
//! figures and panels; the wasm bridge serializes them for a JavaScript plotting
//! front end.

use crate::eigen::EigenDecomposition;
use crate::field::VectorField;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowColor {
    Red,
    Blue,
}

/// Overlay arrow from the origin, e.g. a scaled eigenvector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub dx: f64,
    pub dy: f64,
    pub color: ArrowColor,
}

impl Arrow {
    /// One arrow per eigenpair (real part of the eigenvector, times `scale`),
    /// alternating red and blue.
    pub fn from_eigenvectors(decomposition: &EigenDecomposition, scale: f64) -> Vec<Arrow> {
        decomposition
            .pairs
            .iter()
            .enumerate()
            .filter(|(_, pair)| pair.vector.len() >= 2)
            .map(|(idx, pair)| {
                let direction = pair.scaled_real_direction(scale);
                Arrow {
                    dx: direction[0],
                    dy: direction[1],
                    color: if idx % 2 == 0 {
                        ArrowColor::Red
                    } else {
                        ArrowColor::Blue
                    },
                }
            })
            .collect()
    }
}

/// Row-major copy of a vector field for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamGrid {
    pub rows: usize,
    pub cols: usize,
    pub x1: Vec<f64>,
    pub x2: Vec<f64>,
    pub x1dot: Vec<f64>,
    pub x2dot: Vec<f64>,
    pub color: Vec<f64>,
}

impl From<&VectorField> for StreamGrid {
    fn from(field: &VectorField) -> Self {
        let (rows, cols) = field.shape();
        let row_major = |m: &nalgebra::DMatrix<f64>| m.transpose().as_slice().to_vec();
        Self {
            rows,
            cols,
            x1: row_major(&field.x1),
            x2: row_major(&field.x2),
            x1dot: row_major(&field.x1dot),
            x2dot: row_major(&field.x2dot),
            color: row_major(&field.color),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plot", rename_all = "snake_case")]
pub enum Plot {
    /// `y` against `x`, drawn as a line.
    Line { x: Vec<f64>, y: Vec<f64> },
    /// Points with a per-point opacity; `marker` flags one point (the initial condition).
    Scatter {
        x: Vec<f64>,
        y: Vec<f64>,
        alpha: Vec<f64>,
        marker: Option<[f64; 2]>,
    },
    Stream { grid: StreamGrid, arrows: Vec<Arrow> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub plot: Plot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<Panel>,
}

pub trait Renderer {
    fn show(&mut self, figure: &Figure) -> Result<()>;
}

/// Keeps every figure it is shown.
#[derive(Debug, Default)]
pub struct FigureCollector {
    pub figures: Vec<Figure>,
}

impl Renderer for FigureCollector {
    fn show(&mut self, figure: &Figure) -> Result<()> {
        self.figures.push(figure.clone());
        Ok(())
    }
}
