use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::{Context, Result};

use crate::domain::entities::cell::{Dataset, Row};

/// Sorted union of the keys of every row.
pub fn column_union(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// Computes [`column_union`] on its own thread. The receiver yields exactly one value.
pub fn discover_columns(rows: Dataset) -> Result<Receiver<Vec<String>>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("column-worker".to_string())
        .spawn(move || {
            let _ = tx.send(column_union(&rows));
        })
        .context("failed to spawn column worker thread")?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::cell::row_from;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn union_covers_heterogeneous_rows() {
        let rows = vec![
            row_from([("b", "1"), ("a", "2")]),
            row_from([("c", "3")]),
            row_from([("a", "4")]),
        ];
        assert_eq!(column_union(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn discovery_runs_off_thread() {
        let rows = Arc::new(vec![row_from([("y", "1")]), row_from([("x", "2")])]);
        let rx = discover_columns(rows).expect("column worker should spawn");
        let columns = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("column worker should answer");
        assert_eq!(columns, vec!["x", "y"]);
    }
}
