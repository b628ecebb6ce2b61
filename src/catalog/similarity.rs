use std::{fs::File, io::Read, path::Path};

use indexmap::IndexSet;

use super::ArtifactError;
use crate::models::MovieId;

/// Precomputed item-item similarity table over the item universe
///
/// Rows are stored sparsely: only defined cells are kept, sorted by column.
/// Each row is consulted independently, so an asymmetric table is served as-is.
#[derive(Debug, Clone)]
pub struct SimilarityStore {
    items: IndexSet<MovieId>,
    rows: Vec<Vec<(usize, f64)>>,
}

impl SimilarityStore {
    /// Builds the store from a dense table where `None` marks an undefined cell
    ///
    /// `cells[i][j]` is the similarity of `items[i]` towards `items[j]`.
    pub fn from_rows(
        items: Vec<MovieId>,
        cells: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, ArtifactError> {
        if items.is_empty() {
            return Err(ArtifactError::Empty("similarity matrix"));
        }

        let mut universe = IndexSet::with_capacity(items.len());
        for id in items {
            if universe.contains(&id) {
                return Err(ArtifactError::DuplicateItem(id));
            }
            universe.insert(id);
        }

        let n = universe.len();
        if cells.len() != n {
            return Err(ArtifactError::Malformed(format!(
                "similarity matrix is not square: {} columns but {} rows",
                n,
                cells.len()
            )));
        }

        let mut rows = Vec::with_capacity(n);
        for (i, row) in cells.into_iter().enumerate() {
            if row.len() != n {
                return Err(ArtifactError::Malformed(format!(
                    "similarity row '{}' has {} cells, expected {}",
                    universe[i],
                    row.len(),
                    n
                )));
            }

            let mut defined = Vec::new();
            for (j, cell) in row.into_iter().enumerate() {
                match cell {
                    Some(value) if !value.is_finite() => {
                        return Err(ArtifactError::Malformed(format!(
                            "similarity [{}, {}] is not a finite number",
                            universe[i], universe[j]
                        )));
                    }
                    Some(value) => defined.push((j, value)),
                    None => {}
                }
            }
            rows.push(defined);
        }

        Ok(Self {
            items: universe,
            rows,
        })
    }

    /// Parses a CSV table whose header row lists the item ids
    ///
    /// A leading label column is accepted when the first header cell is blank.
    /// Blank, `NA` and `NaN` cells are undefined.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let labeled = headers.get(0).is_some_and(str::is_empty);
        let items: Vec<MovieId> = headers
            .iter()
            .skip(usize::from(labeled))
            .map(MovieId::from)
            .collect();

        let mut cells = Vec::with_capacity(items.len());
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut fields = record.iter();

            if labeled {
                let label = fields.next().unwrap_or_default();
                match items.get(row) {
                    Some(expected) if expected.as_str() == label => {}
                    Some(expected) => {
                        return Err(ArtifactError::Malformed(format!(
                            "similarity row {} is labeled '{}' but the header expects '{}'",
                            row + 1,
                            label,
                            expected
                        )));
                    }
                    // Row-count mismatch is reported by from_rows
                    None => {}
                }
            }

            let values = fields
                .map(parse_cell)
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(values);
        }

        Self::from_rows(items, cells)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Items of the universe in catalog order
    pub fn items(&self) -> &IndexSet<MovieId> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    /// Defined neighbors of the item at `index` as `(column, similarity)` pairs
    pub fn neighbors(&self, index: usize) -> &[(usize, f64)] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Defined neighbors of `id` keyed by neighbor id, or `None` if `id` is outside the universe
    pub fn row(&self, id: &str) -> Option<impl Iterator<Item = (&MovieId, f64)> + '_> {
        let index = self.index_of(id)?;
        Some(
            self.neighbors(index)
                .iter()
                .map(|&(j, value)| (&self.items[j], value)),
        )
    }

    pub fn similarity(&self, from: usize, to: usize) -> Option<f64> {
        let row = self.neighbors(from);
        row.binary_search_by_key(&to, |&(j, _)| j)
            .ok()
            .map(|pos| row[pos].1)
    }

    /// Number of defined cells across the whole table
    pub fn defined_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

fn parse_cell(cell: &str) -> Result<Option<f64>, ArtifactError> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| ArtifactError::Malformed(format!("invalid similarity value '{}'", cell)))
}
