//! The documented exploration scenarios, composed into figures.
//!
//! Parameters are fixed here; the numerical work happens in `euler`,
//! `trajectory`, `field` and `eigen`.

use crate::eigen::eigen_decompose;
use crate::euler::integrate_exponential;
use crate::field::sample_vector_field;
use crate::grid::GridRange;
use crate::linear::LinearSystem;
use crate::render::{Arrow, Figure, Panel, Plot, Renderer, StreamGrid};
use crate::trajectory::solve_trajectory;
use anyhow::{Context, Result};
use nalgebra::DMatrix;

/// Length of the eigenvector overlay arrows on stream plots.
pub const EIGENVECTOR_ARROW_SCALE: f64 = 20.0;

/// `(a, dt)` for the four forward-Euler panels, with their titles.
pub const EXPONENTIAL_RUNS: [(f64, f64, &str); 4] = [
    (-0.5, 0.001, "a < 0, dt = 0.001"),
    (0.5, 0.001, "a > 0, dt = 0.001"),
    (0.0, 0.001, "a = 0, dt = 0.001"),
    (0.1, 0.1, "a > 0, dt = 0.1"),
];
pub const EXPONENTIAL_X0: f64 = 1.0;
pub const EXPONENTIAL_DURATION: f64 = 10.0;

pub const ORBIT_MATRIX: [f64; 4] = [2.0, -5.0, 1.0, -2.0];
pub const ORBIT_X0: [f64; 2] = [-0.1, 0.2];
pub const ORBIT_DT: f64 = 0.1;
pub const ORBIT_DURATION: f64 = 6.0;

/// Row-major matrices for the 2x2 stream plot overview: a stable node, a
/// saddle, a stable spiral and the closed orbit.
pub const STREAM_EXAMPLES: [[f64; 4]; 4] = [
    [-1.0, 0.0, 0.0, -2.0],
    [1.0, 2.0, 2.0, 1.0],
    [-0.5, -2.0, 2.0, -0.5],
    [2.0, -5.0, 1.0, -2.0],
];

/// Real part of `x(t)` for each forward-Euler run, laid out 2x2.
pub fn exponential_figure() -> Result<Figure> {
    let mut panels = Vec::with_capacity(EXPONENTIAL_RUNS.len());
    for (a, dt, title) in EXPONENTIAL_RUNS {
        let result = integrate_exponential(a, EXPONENTIAL_X0, dt, EXPONENTIAL_DURATION)
            .with_context(|| format!("Euler run \"{title}\" failed"))?;
        panels.push(Panel {
            title: Some(title.to_string()),
            x_label: "time".to_string(),
            y_label: "x".to_string(),
            plot: Plot::Line {
                x: result.times.clone(),
                y: result.real_parts(),
            },
        });
    }
    // Panels are row-major; the a > 0 run goes bottom left, under a < 0.
    panels.swap(1, 2);
    Ok(Figure {
        title: None,
        rows: 2,
        cols: 2,
        panels,
    })
}

/// x1 and x2 against time plus the phase portrait, with the initial condition marked.
pub fn trajectory_figure(
    system: &LinearSystem,
    x0: &[f64],
    dt: f64,
    t_final: f64,
    title: Option<&str>,
) -> Result<Figure> {
    let trajectory = solve_trajectory(system, x0, dt, t_final)
        .with_context(|| format!("Trajectory from {x0:?} over T = {t_final} failed"))?;
    anyhow::ensure!(
        trajectory.dimension() == 2,
        "Trajectory figures need a planar system (got dimension {}).",
        trajectory.dimension()
    );

    let alpha = trajectory.time_colors();
    let x1 = trajectory.component(0);
    let x2 = trajectory.component(1);
    let scatter = |x: Vec<f64>, y: Vec<f64>, marker: Option<[f64; 2]>| Plot::Scatter {
        x,
        y,
        alpha: alpha.clone(),
        marker,
    };

    let panels = vec![
        Panel {
            title: None,
            x_label: "time".to_string(),
            y_label: "x1".to_string(),
            plot: scatter(trajectory.times.clone(), x1.clone(), None),
        },
        Panel {
            title: None,
            x_label: "time".to_string(),
            y_label: "x2".to_string(),
            plot: scatter(trajectory.times.clone(), x2.clone(), None),
        },
        Panel {
            title: None,
            x_label: "x1".to_string(),
            y_label: "x2".to_string(),
            plot: scatter(x1, x2, Some([x0[0], x0[1]])),
        },
    ];
    log::info!(
        "trajectory figure: {} samples, {} solver steps",
        trajectory.len(),
        trajectory.stats.accepted
    );
    Ok(Figure {
        title: title.map(str::to_string),
        rows: 1,
        cols: 3,
        panels,
    })
}

/// Stream plot of `A` over the default grid with eigenvector arrows.
pub fn stream_panel(matrix: &DMatrix<f64>, title: Option<String>) -> Result<Panel> {
    let field = sample_vector_field(matrix, &GridRange::default())
        .context("Failed to sample vector field.")?;
    let decomposition =
        eigen_decompose(matrix).context("Failed to compute eigenvalues/eigenvectors.")?;
    Ok(Panel {
        title,
        x_label: "x1".to_string(),
        y_label: "x2".to_string(),
        plot: Plot::Stream {
            grid: StreamGrid::from(&field),
            arrows: Arrow::from_eigenvectors(&decomposition, EIGENVECTOR_ARROW_SCALE),
        },
    })
}

/// One stream plot per matrix in a 2x2 layout, titled with the eigenvalues.
pub fn stream_examples_figure(options: &[DMatrix<f64>]) -> Result<Figure> {
    let mut panels = Vec::with_capacity(options.len());
    for (i, matrix) in options.iter().enumerate() {
        let decomposition = eigen_decompose(matrix)
            .with_context(|| format!("Stream example {i} has an invalid matrix"))?;
        let title = format!(
            "A with eigenvalues\n{}",
            decomposition.eigenvalue_label()
        );
        panels.push(stream_panel(matrix, Some(title))?);
    }
    Ok(Figure {
        title: None,
        rows: 2,
        cols: 2,
        panels,
    })
}

pub fn stream_examples() -> Vec<DMatrix<f64>> {
    STREAM_EXAMPLES
        .iter()
        .map(|entries| DMatrix::from_row_slice(2, 2, entries))
        .collect()
}

/// Runs every documented scenario in order and shows each figure.
pub fn run_documented_scenarios(renderer: &mut dyn Renderer) -> Result<()> {
    log::info!("scenario: forward Euler on dx/dt = a x");
    renderer.show(&exponential_figure()?)?;

    log::info!("scenario: closed orbit of A = {ORBIT_MATRIX:?}");
    let [a00, a01, a10, a11] = ORBIT_MATRIX;
    let system = LinearSystem::planar(a00, a01, a10, a11);
    renderer.show(&trajectory_figure(
        &system,
        &ORBIT_X0,
        ORBIT_DT,
        ORBIT_DURATION,
        None,
    )?)?;

    log::info!("scenario: stream plot overview");
    renderer.show(&stream_examples_figure(&stream_examples())?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FigureCollector;

    #[test]
    fn exponential_figure_layout() {
        let figure = exponential_figure().expect("figure");
        assert_eq!((figure.rows, figure.cols), (2, 2));
        let titles: Vec<_> = figure
            .panels
            .iter()
            .map(|p| p.title.clone().unwrap())
            .collect();
        assert_eq!(
            titles,
            vec![
                "a < 0, dt = 0.001",
                "a = 0, dt = 0.001",
                "a > 0, dt = 0.001",
                "a > 0, dt = 0.1"
            ]
        );
        match &figure.panels[3].plot {
            Plot::Line { x, y } => {
                assert_eq!(x.len(), 100);
                assert_eq!(y.len(), 100);
            }
            other => panic!("unexpected plot {other:?}"),
        }
    }

    #[test]
    fn trajectory_figure_marks_initial_condition() {
        let [a00, a01, a10, a11] = ORBIT_MATRIX;
        let system = LinearSystem::planar(a00, a01, a10, a11);
        let figure = trajectory_figure(&system, &ORBIT_X0, ORBIT_DT, ORBIT_DURATION, Some("orbit"))
            .expect("figure");
        assert_eq!((figure.rows, figure.cols), (1, 3));
        assert_eq!(figure.title.as_deref(), Some("orbit"));
        match &figure.panels[2].plot {
            Plot::Scatter {
                x,
                y,
                alpha,
                marker,
            } => {
                assert_eq!(x.len(), 60);
                assert_eq!(y.len(), 60);
                assert_eq!(alpha[0], 0.0);
                assert_eq!(alpha[59], 1.0);
                assert_eq!(*marker, Some(ORBIT_X0));
                assert_eq!((x[0], y[0]), (ORBIT_X0[0], ORBIT_X0[1]));
            }
            other => panic!("unexpected plot {other:?}"),
        }
    }

    #[test]
    fn trajectory_figure_rejects_non_planar_systems() {
        let system = LinearSystem::from_row_slice(1, &[-1.0]).unwrap();
        let err = trajectory_figure(&system, &[1.0], 0.1, 1.0, None).expect_err("1-D");
        assert!(err.to_string().contains("planar"));
    }

    #[test]
    fn stream_examples_titles_carry_eigenvalues() {
        let figure = stream_examples_figure(&stream_examples()).expect("figure");
        assert_eq!(figure.panels.len(), 4);
        let title = figure.panels[0].title.clone().unwrap();
        assert!(title.starts_with("A with eigenvalues\n["));
        assert!(title.contains("-1.00") && title.contains("-2.00"));
        let spiral = figure.panels[2].title.clone().unwrap();
        assert!(spiral.contains("-0.50+2.00j") && spiral.contains("-0.50-2.00j"));
        for panel in &figure.panels {
            match &panel.plot {
                Plot::Stream { grid, arrows } => {
                    assert_eq!((grid.rows, grid.cols), (41, 41));
                    assert_eq!(arrows.len(), 2);
                    for arrow in arrows {
                        let length = arrow.dx.hypot(arrow.dy);
                        assert!(length <= EIGENVECTOR_ARROW_SCALE + 1e-9);
                    }
                }
                other => panic!("unexpected plot {other:?}"),
            }
        }
    }

    #[test]
    fn documented_scenarios_show_three_figures() {
        let mut collector = FigureCollector::default();
        run_documented_scenarios(&mut collector).expect("scenarios");
        let layouts: Vec<_> = collector
            .figures
            .iter()
            .map(|f| (f.rows, f.cols, f.panels.len()))
            .collect();
        assert_eq!(layouts, vec![(2, 2, 4), (1, 3, 3), (2, 2, 4)]);
    }

    #[test]
    fn renderer_failure_propagates() {
        struct Broken;
        impl Renderer for Broken {
            fn show(&mut self, _figure: &Figure) -> Result<()> {
                anyhow::bail!("display unavailable")
            }
        }
        let err = run_documented_scenarios(&mut Broken).expect_err("renderer error");
        assert!(err.to_string().contains("display unavailable"));
    }
}
