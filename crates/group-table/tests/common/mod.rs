use group_table::{Table, Value};

pub const PERSON_COLUMNS: [&str; 5] = ["id", "name", "age", "sex", "class"];

pub fn person_rows() -> Vec<Vec<Value>> {
    let row = |id: i64, name: &str, age: i64, sex: &str, class: Value| {
        vec![
            Value::from(id),
            Value::from(name),
            Value::from(age),
            Value::from(sex),
            class,
        ]
    };
    vec![
        row(1, "a", 10, "man", 1.into()),
        row(2, "b", 11, "man", 1.into()),
        row(3, "c", 10, "woman", 2.into()),
        row(4, "d", 13, "man", 2.into()),
        row(5, "e", 10, "man", "一班".into()),
        row(6, "f", 17, "man", 1.into()),
        row(7, "g", 18, "woman", 2.into()),
        row(8, "h", 19, "man", 3.into()),
        row(9, "i", 30, "woman", 3.into()),
        row(10, "j", 20, "man", 3.into()),
        row(11, "k", 15, "man", 3.into()),
    ]
}

pub fn build_person_table() -> Table {
    let mut table = Table::new("person");
    table.load(&PERSON_COLUMNS, person_rows()).unwrap();
    table
}
