use crate::dataset::{DataView, RowIter};
use crate::schema::Schema;
use crate::transform::RowMapper;
use std::sync::Arc;

/// A view that applies one [`RowMapper`] to the rows of another view.
///
/// Nothing is computed until a cursor is pulled. A cursor asks its input only
/// for the columns the mapper needs to fill the requested outputs.
pub struct MappedView {
    input: Arc<dyn DataView>,
    mapper: Arc<dyn RowMapper>,
}

impl MappedView {
    pub fn new(input: Arc<dyn DataView>, mapper: Arc<dyn RowMapper>) -> Self {
        debug_assert_eq!(input.schema(), mapper.input_schema());
        Self { input, mapper }
    }

    pub fn input(&self) -> &Arc<dyn DataView> {
        &self.input
    }
}

impl DataView for MappedView {
    fn schema(&self) -> &Schema {
        self.mapper.output_schema()
    }

    fn row_count(&self) -> Option<usize> {
        self.input.row_count()
    }

    fn cursor(&self, active: &[bool]) -> RowIter<'_> {
        let needed = self.mapper.dependencies(active);
        let active = active.to_vec();
        let mapper = &self.mapper;
        Box::new(
            self.input
                .cursor(&needed)
                .map(move |row| row.and_then(|row| mapper.map_row(&row, &active))),
        )
    }
}
