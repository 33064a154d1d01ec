/// Table and index inferred from a clicked object path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSelection {
    pub table: Option<String>,
    pub index: Option<String>,
}

/// Infers the selected table and index from a navigation hierarchy.
///
/// The backend does not describe object types; the folder names it emits are
/// the only signal. Implementations encode a folder naming convention, so keep
/// them replaceable.
pub trait PathClassifier: Send + Sync {
    fn classify(&self, hierarchy: &[String]) -> ObjectSelection;
}

/// Classifier for the `Tables\<table>\Indexes\<index>` folder layout.
///
/// Precedence:
/// 1. A `tables` segment: the table is the next segment, and the index is the
///    segment after a later `indexes`/`index` segment, if any.
/// 2. Only an `indexes`/`index` segment: the table is the segment after the
///    nearest preceding `tables` segment (server and database included), else
///    the segment right before the index folder.
/// 3. Neither: hierarchy index 2 is taken as the table.
///
/// Tokens match whole segments, ignoring ASCII case. Forward scans start after
/// the server and database segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionClassifier;

const FIRST_OBJECT_SEGMENT: usize = 2;

fn is_tables(segment: &str) -> bool {
    segment.eq_ignore_ascii_case("tables")
}

fn is_indexes(segment: &str) -> bool {
    segment.eq_ignore_ascii_case("indexes") || segment.eq_ignore_ascii_case("index")
}

fn position_from(hierarchy: &[String], start: usize, pred: fn(&str) -> bool) -> Option<usize> {
    hierarchy
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, segment)| pred(segment))
        .map(|(i, _)| i)
}

impl PathClassifier for ConventionClassifier {
    fn classify(&self, hierarchy: &[String]) -> ObjectSelection {
        let after = |i: usize| hierarchy.get(i + 1).cloned();

        if let Some(tables_at) = position_from(hierarchy, FIRST_OBJECT_SEGMENT, is_tables) {
            let index = position_from(hierarchy, tables_at + 2, is_indexes).and_then(after);
            return ObjectSelection {
                table: after(tables_at),
                index,
            };
        }

        if let Some(indexes_at) = position_from(hierarchy, FIRST_OBJECT_SEGMENT, is_indexes) {
            let table = hierarchy[..indexes_at]
                .iter()
                .rposition(|segment| is_tables(segment))
                .and_then(after)
                .or_else(|| {
                    indexes_at
                        .checked_sub(1)
                        .and_then(|i| hierarchy.get(i).cloned())
                });

            return ObjectSelection {
                table,
                index: after(indexes_at),
            };
        }

        ObjectSelection {
            table: hierarchy.get(FIRST_OBJECT_SEGMENT).cloned(),
            index: None,
        }
    }
}
