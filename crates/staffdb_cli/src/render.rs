//! Plain-text rendering of read rows.

use staffdb_core::{Employee, EmployeeTable};

pub const DEFAULT_SAMPLE_ROWS: usize = 5;
const CELL_WIDTH: usize = 12;

/// Renders at most `max_rows` rows under a right-aligned header.
pub fn render_sample(table: &EmployeeTable, max_rows: usize) -> String {
    if table.is_empty() {
        return "no rows to display\n".to_string();
    }

    let header = table
        .columns
        .iter()
        .map(|column| format!("{column:>CELL_WIDTH$}"))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut out = format!("\n{header}\n{}\n", "-".repeat(header.chars().count()));
    for employee in table.rows.iter().take(max_rows) {
        let line = cells(employee)
            .iter()
            .map(|cell| format!("{cell:>CELL_WIDTH$}"))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(&line);
        out.push('\n');
    }
    if table.len() > max_rows {
        out.push_str(&format!("... ({} more rows)\n", table.len() - max_rows));
    }
    out
}

fn cells(employee: &Employee) -> [String; 5] {
    [
        employee.employee_id.to_string(),
        employee.first_name.clone(),
        employee.last_name.clone(),
        employee
            .department
            .clone()
            .unwrap_or_else(|| "None".to_string()),
        employee
            .salary
            .map_or_else(|| "None".to_string(), |salary| salary.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::render_sample;
    use staffdb_core::{default_seed_rows, EmployeeTable};

    fn seeded_table() -> EmployeeTable {
        EmployeeTable {
            columns: ["employee_id", "first_name", "last_name", "department", "salary"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            rows: default_seed_rows(),
        }
    }

    #[test]
    fn sample_is_truncated_with_remainder_line() {
        let rendered = render_sample(&seeded_table(), 2);
        let lines = rendered.lines().filter(|line| !line.is_empty()).collect::<Vec<_>>();
        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains("John"));
        assert!(lines[3].contains("Jane"));
        assert_eq!(lines[4], "... (3 more rows)");
    }

    #[test]
    fn empty_table_renders_placeholder() {
        assert_eq!(
            render_sample(&EmployeeTable::default(), 5),
            "no rows to display\n"
        );
    }
}
