use gridpad_core::{
    Grid, GridDimensions, GridStore, KeyValueStore, SqliteKeyValueStore, DEFAULT_STORAGE_KEY,
};

fn file_store(path: &std::path::Path) -> GridStore<SqliteKeyValueStore> {
    GridStore::with_defaults(SqliteKeyValueStore::open(path).unwrap())
}

#[test]
fn set_cell_changes_only_the_target_cell() {
    let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
    let mut grid = store.load();
    grid = store.set_cell(&grid, 4, 2, "seed").unwrap();

    for row in 0..10 {
        for col in 0..5 {
            let edited = store.set_cell(&grid, row, col, "value").unwrap();
            assert_eq!(edited.cell(row, col).unwrap(), "value");
            for (index, (left, right)) in edited.rows().zip(grid.rows()).enumerate() {
                if index != row {
                    assert_eq!(left, right);
                    assert!(edited.shares_row_with(&grid, index));
                }
            }
            for other_col in (0..5).filter(|other| *other != col) {
                assert_eq!(
                    edited.cell(row, other_col).unwrap(),
                    grid.cell(row, other_col).unwrap()
                );
            }
        }
    }
}

#[test]
fn load_after_persist_returns_equal_grid() {
    let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
    let grid = Grid::empty(GridDimensions::DEFAULT)
        .with_cell(0, 0, "")
        .unwrap()
        .with_cell(3, 4, "tab\there \"quoted\" ü 🧮")
        .unwrap()
        .with_cell(9, 0, "  padded  ")
        .unwrap();

    store.persist(&grid).unwrap();
    assert_eq!(store.load(), grid);
}

#[test]
fn persisted_snapshot_is_nested_string_array() {
    let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
    let grid = store.apply_edit(&store.load(), 1, 1, "42").unwrap();

    let raw = store.store().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let decoded: Vec<Vec<String>> = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded.len(), 10);
    assert!(decoded.iter().all(|row| row.len() == 5));
    assert_eq!(decoded[1][1], "42");
    assert_eq!(decoded, grid.to_rows());
}

#[test]
fn corrupt_or_misshapen_snapshot_loads_as_empty_grid() {
    for payload in ["{not json", "[]", r#"[["a","b","c","d","e"]]"#, r#"[[1]]"#] {
        let store = GridStore::with_defaults(SqliteKeyValueStore::open_in_memory().unwrap());
        store.store().set(DEFAULT_STORAGE_KEY, payload).unwrap();

        let grid = store.load();
        assert_eq!(grid, Grid::empty(GridDimensions::new(10, 5)), "{payload}");
    }
}

#[test]
fn edits_survive_reopen_in_fresh_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.sqlite3");

    {
        let store = file_store(&path);
        let mut grid = store.load();
        grid = store.apply_edit(&grid, 0, 0, "Name").unwrap();
        grid = store.apply_edit(&grid, 0, 1, "Score").unwrap();
        grid = store.apply_edit(&grid, 1, 0, "Alice").unwrap();
        grid = store.apply_edit(&grid, 1, 1, "42").unwrap();
        store.persist(&grid).unwrap();
    }

    let reloaded = file_store(&path).load();
    assert_eq!(reloaded.cell(0, 0).unwrap(), "Name");
    assert_eq!(reloaded.cell(1, 1).unwrap(), "42");
    assert_eq!(reloaded.cell(9, 4).unwrap(), "");
}
