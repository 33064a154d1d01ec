use dbnav_core::{Connection, NodeId, ObjectRecord};

pub const SERVER: &str = "sql01";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn connection() -> Connection {
    Connection::new(SERVER, "sa", "secret")
}

pub fn other_connection() -> Connection {
    Connection::new("sql02", "sa", "secret")
}

/// `Sales`: one table with an index, a view and a procedure.
pub fn sales_records() -> Vec<ObjectRecord> {
    vec![
        ObjectRecord::new("Tables\\dbo.Orders", "dbo.Orders"),
        ObjectRecord::new("Tables\\dbo.Orders\\Indexes", "IX_Orders_1"),
        ObjectRecord::new("Views", "dbo.ActiveOrders"),
        ObjectRecord::new("Programmability\\Stored Procedures", "usp_Reindex"),
    ]
}

/// `HR`: a single table without indexes.
pub fn hr_records() -> Vec<ObjectRecord> {
    vec![ObjectRecord::new("Tables\\dbo.People", "dbo.People")]
}

pub fn id(path: &str) -> NodeId {
    NodeId::new(path)
}

pub fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
