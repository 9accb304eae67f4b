mod common;

use common::{SCHEMA, SqlDir, vchord};

#[test]
fn test_text_report() {
    let dir = SqlDir::new();
    let file = dir.write(
        "items.sql",
        &format!("{}\nknn: SELECT id FROM items ORDER BY embedding <=> ? LIMIT 5;", SCHEMA),
    );

    let output = vchord(&[file.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("embedding vector"), "{}", stdout);
    assert!(stdout.contains("query knn"), "{}", stdout);
    assert!(stdout.contains("bind_string(0, arg0)"), "{}", stdout);
}

#[test]
fn test_json_report() {
    let dir = SqlDir::new();
    let file = dir.write("items.sql", SCHEMA);

    let output = vchord(&["--json", file.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let columns = &report[file.to_str().unwrap()]["tables"][0]["columns"];
    assert_eq!(columns[2]["type"]["type"], "vector");
    assert_eq!(columns[2]["type"]["host_type"], "String");
}

#[test]
fn test_failure_exit_code() {
    let dir = SqlDir::new();
    let good = dir.write("good.sql", SCHEMA);
    let bad = dir.write("bad.sql", "SELECT * FROM nowhere;");

    let output = vchord(&[good.to_str().unwrap(), bad.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown table: nowhere"), "{}", stderr);
    assert!(dir.path().exists());
}

#[test]
fn test_unknown_module() {
    let dir = SqlDir::new();
    let file = dir.write("items.sql", SCHEMA);

    let output = vchord(&["--module", "postgis", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("postgis"), "{}", stderr);
}

const PLACES: &str = "
CREATE TABLE places (id INT, location POINT, embedding VECTOR(3));
same: SELECT id FROM places WHERE location ~= ?;
knn: SELECT id FROM places ORDER BY embedding <=> ? LIMIT 3;
";

#[test]
fn test_point_layer_is_linked() {
    let dir = SqlDir::new();
    let file = dir.write("places.sql", PLACES);

    let output = vchord(&["--module", "point,vectorchord", file.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("location point"), "{}", stdout);
    assert!(stdout.contains("argument ? point -> bind_string(0, arg0)"), "{}", stdout);

    let output = vchord(&["--all-modules", file.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);

    let output = vchord(&[file.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_error_reported_once() {
    let dir = SqlDir::new();
    let bad = dir.write("bad.sql", "SELECT * FROM nowhere;");

    let output = vchord(&[bad.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Unknown table: nowhere").count(), 1, "{}", stderr);
}
