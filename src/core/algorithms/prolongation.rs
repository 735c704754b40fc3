//! Attribute prolongation into empty cells.
//!
//! Cells whose attribute was never assigned (or is zero) are filled from their
//! neighbors, front by front, until every listed cell has a value.

use crate::core::cell::CellId;
use crate::core::mesh::{Mesh, MeshError};
use crate::core::util::ATTRIBUTE_TOLERANCE;

/// What [`fill_empty_cells`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProlongationReport {
    /// Neighbor-averaging rounds performed.
    pub rounds: usize,
    /// Cells filled from their neighbors.
    pub from_neighbours: usize,
    /// Cells filled with the background value or the mesh-wide mean.
    pub from_fallback: usize,
}

/// Assigns attributes to the cells `cells`.
///
/// With a `background` value every listed cell simply takes it. Otherwise each
/// round gives every still-empty listed cell the mean attribute of its
/// neighbors whose attribute exceeds [`ATTRIBUTE_TOLERANCE`]; values computed
/// in a round are applied together at its end, so a round never feeds on
/// itself. Cells without such neighbors wait for the next round. A round that
/// fills nothing assigns the mean attribute of the whole mesh to the remaining
/// cells and stops.
///
/// Derives adjacency first if it is not known.
///
/// # Errors
///
/// Returns [`MeshError::CellNotFound`] for an unknown id and
/// [`MeshError::Adjacency`] if adjacency derivation fails.
///
/// # Examples
///
/// ```rust
/// use meshtopo::core::algorithms::prolongation::fill_empty_cells;
/// use meshtopo::core::cell::CellId;
/// use meshtopo::geometry::util::grid_generation::create_1d_grid;
///
/// let mut mesh = create_1d_grid(&[0.0, 1.0, 2.0, 3.0]).unwrap();
/// mesh.set_cell_attributes(&[2.0, 0.0, 4.0]).unwrap();
/// let report = fill_empty_cells(&mut mesh, &[CellId::new(1)], None).unwrap();
/// assert_eq!(mesh.cell_attributes(), vec![2.0, 3.0, 4.0]);
/// assert_eq!(report.rounds, 1);
/// ```
pub fn fill_empty_cells(
    mesh: &mut Mesh,
    cells: &[CellId],
    background: Option<f64>,
) -> Result<ProlongationReport, MeshError> {
    let mut report = ProlongationReport::default();
    if let Some(&cell) = cells.iter().find(|c| mesh.get_cell(**c).is_none()) {
        return Err(MeshError::CellNotFound {
            cell,
            count: mesh.cell_count(),
        });
    }
    if let Some(value) = background {
        for &cell in cells {
            mesh.cell_mut(cell).set_attribute(value);
        }
        report.from_fallback = cells.len();
        return Ok(report);
    }
    mesh.create_neighbour_infos(false)?;

    let mut pending = cells.to_vec();
    while !pending.is_empty() {
        report.rounds += 1;
        let mut waiting = Vec::new();
        let mut filled = Vec::with_capacity(pending.len());
        for &cell in &pending {
            match neighbour_mean(mesh, cell) {
                Some(value) => filled.push((cell, value)),
                None => waiting.push(cell),
            }
        }
        report.from_neighbours += filled.len();
        for (cell, value) in filled {
            mesh.cell_mut(cell).set_attribute(value);
        }

        if waiting.len() == pending.len() {
            let fallback = mean(&mesh.cell_attributes());
            tracing::warn!(
                cells = waiting.len(),
                fallback,
                "cannot fill cells from their neighbors; using the mesh-wide mean attribute"
            );
            for &cell in &waiting {
                mesh.cell_mut(cell).set_attribute(fallback);
            }
            report.from_fallback += waiting.len();
            break;
        }
        pending = waiting;
    }

    tracing::debug!(
        rounds = report.rounds,
        from_neighbours = report.from_neighbours,
        from_fallback = report.from_fallback,
        "filled empty cells"
    );
    Ok(report)
}

fn neighbour_mean(mesh: &Mesh, cell: CellId) -> Option<f64> {
    let values: Vec<f64> = mesh
        .cell(cell)
        .neighbours()
        .iter()
        .flatten()
        .map(|&n| mesh.cell(n).attribute())
        .filter(|&a| a > ATTRIBUTE_TOLERANCE)
        .collect();
    (!values.is_empty()).then(|| mean(&values))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[expect(clippy::cast_precision_loss, reason = "cell counts stay far below 2^52")]
    let count = values.len() as f64;
    values.iter().sum::<f64>() / count
}

impl Mesh {
    /// Fills the attributes of `cells`; see [`fill_empty_cells`].
    ///
    /// # Errors
    ///
    /// See [`fill_empty_cells`].
    pub fn fill_empty_cells(
        &mut self,
        cells: &[CellId],
        background: Option<f64>,
    ) -> Result<ProlongationReport, MeshError> {
        fill_empty_cells(self, cells, background)
    }
}
