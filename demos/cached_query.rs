//! Miss-then-hit walkthrough
//!
//! Wires a toy in-memory row source into the capture/replay flow: the first
//! execution is captured while being read, the second is replayed from the
//! cache, and a table write invalidates the entry again.

use std::sync::Arc;

use result_cache::{
    CacheConfig, CacheError, CacheManager, CaptureCursor, DefaultCacheProvider, QueryInfo, Result,
    ResultCursor, RowSource, SourceColumn, Value,
};

/// A row source backed by a vector, standing in for a live execution engine
struct VecSource {
    columns: Vec<SourceColumn>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl VecSource {
    fn new() -> Self {
        Self {
            columns: vec![
                SourceColumn::new("id", "BIGINT").with_precision(19, 0),
                SourceColumn::new("name", "VARCHAR"),
            ],
            rows: vec![
                vec![Value::Integer(1), Value::Text("alice".to_string())],
                vec![Value::Integer(2), Value::Text("bob".to_string())],
                vec![Value::Integer(3), Value::Null],
            ],
            position: None,
        }
    }
}

impl RowSource for VecSource {
    fn columns(&self) -> Result<Vec<SourceColumn>> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn read(&mut self, ordinal: usize) -> Result<Value> {
        let position = self.position.ok_or(CacheError::NoCurrentRow)?;
        Ok(self.rows[position][ordinal].clone())
    }

    fn close(&mut self) -> Result<()> {
        println!("  (live source closed)");
        Ok(())
    }
}

fn print_rows(cursor: &mut impl ResultCursor) -> Result<()> {
    while cursor.next()? {
        let id = cursor.get_i64(0)?;
        let name = cursor.get_str(1)?;
        println!("  id={:?} name={:?}", id, name);
    }
    Ok(())
}

fn main() -> Result<()> {
    let provider = Arc::new(DefaultCacheProvider::new(CacheConfig::development()));
    let manager = Arc::new(CacheManager::new(provider)?);

    let query = "SELECT id, name FROM users";
    let params: Vec<Value> = vec![];

    println!("first execution (miss, captured from the live source):");
    match manager.get_cached_data_if_present(query, &params)? {
        Some(_) => unreachable!("nothing cached yet"),
        None => {
            let info = QueryInfo::new(query, params.clone()).with_tables(["users"]);
            let mut cursor = CaptureCursor::new(VecSource::new(), info, Arc::clone(&manager))?;
            print_rows(&mut cursor)?;
            cursor.close()?;
        }
    }

    println!("second execution (hit, replayed from memory):");
    let data = manager
        .get_cached_data_if_present(query, &params)?
        .expect("cached by the capture close");
    print_rows(&mut data.replay())?;

    println!("after a write to \"users\" (invalidated, back to a miss):");
    manager.clear_by_table("users");
    match manager.get_cached_data_if_present(query, &params)? {
        Some(_) => unreachable!("entry was invalidated"),
        None => println!("  cache miss, would re-execute"),
    }

    Ok(())
}
