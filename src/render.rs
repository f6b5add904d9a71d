// src/render.rs
use anyhow::Result;
use prettytable::{format, Cell, Row as PtRow, Table as PtTable};
use std::io::Write;

use trendreport::dispatch::Outcome;
use trendreport::report::WriteStatus;
use trendreport::table::Table;

/// Write `outcome` for a person (box tables) or, with `json`, as pretty JSON.
pub fn render<W: Write>(
    out: &mut W,
    outcome: &Outcome,
    date_format: &str,
    json: bool,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, outcome)?;
        writeln!(out)?;
        return Ok(());
    }

    match outcome {
        Outcome::Exit => {}
        Outcome::Line { label, value } => match value {
            Some(v) => writeln!(out, "{}: {}", label, v)?,
            None => writeln!(out, "{}: (not present)", label)?,
        },
        Outcome::Columns { names } => {
            for (i, name) in names.iter().enumerate() {
                writeln!(out, "{:>3}  {}", i + 1, name)?;
            }
        }
        Outcome::Rows { table } => print_table(out, table, date_format)?,
        Outcome::Max { column, entry } => match entry {
            Some(e) => writeln!(
                out,
                "Highest {}: {} (row {})",
                column,
                format_number(e.value),
                e.position + 1
            )?,
            None => writeln!(out, "{} has no values", column)?,
        },
        Outcome::Ranking { columns, ranking } => {
            let mut header = vec!["#".to_string()];
            header.extend(columns.iter().cloned());
            let mut t = boxed(&header[..]);
            for (i, e) in ranking.entries.iter().enumerate() {
                let mut cells = vec![Cell::new(&(i + 1).to_string()).style_spec("r")];
                cells.extend(e.row.values().iter().map(|v| Cell::new(&v.render(date_format))));
                t.add_row(PtRow::new(cells));
            }
            t.print(out)?;
        }
        Outcome::Summary { results } => {
            for res in results {
                writeln!(out, "{} by month", res.column)?;
                let mut t = boxed(&["Month", "Rows", "Mean"]);
                for g in &res.groups {
                    let mean = g.mean.map_or_else(|| "-".to_string(), format_number);
                    t.add_row(PtRow::new(vec![
                        Cell::new(&g.key),
                        Cell::new(&g.count.to_string()).style_spec("r"),
                        Cell::new(&mean).style_spec("r"),
                    ]));
                }
                t.print(out)?;
                if res.unkeyed > 0 {
                    writeln!(out, "{} rows had no date", res.unkeyed)?;
                }
            }
        }
        Outcome::Totals { filter, totals } => {
            if let Some(f) = filter {
                writeln!(out, "Totals where {}", f)?;
            }
            let mut t = boxed(&["Column", "Total", "Rows"]);
            for total in totals {
                t.add_row(PtRow::new(vec![
                    Cell::new(&total.column),
                    Cell::new(&format_number(total.total)).style_spec("r"),
                    Cell::new(&total.rows.to_string()).style_spec("r"),
                ]));
            }
            t.print(out)?;
        }
        Outcome::TopGroups {
            group_column,
            column,
            groups,
        } => {
            let total_header = format!("Total {}", column);
            let mut t = boxed(&[group_column.as_str(), total_header.as_str(), "Rows"]);
            for g in groups {
                t.add_row(PtRow::new(vec![
                    Cell::new(&g.key),
                    Cell::new(&format_number(g.total)).style_spec("r"),
                    Cell::new(&g.count.to_string()).style_spec("r"),
                ]));
            }
            t.print(out)?;
        }
        Outcome::Stats { column, stats } => match stats {
            Some(s) => {
                let mut t = boxed(&["Column", "Count", "Sum", "Mean", "Min", "Max"]);
                t.add_row(PtRow::new(vec![
                    Cell::new(column),
                    Cell::new(&s.count.to_string()).style_spec("r"),
                    Cell::new(&format_number(s.sum)).style_spec("r"),
                    Cell::new(&format_number(s.mean)).style_spec("r"),
                    Cell::new(&format_number(s.min)).style_spec("r"),
                    Cell::new(&format_number(s.max)).style_spec("r"),
                ]));
                t.print(out)?;
            }
            None => writeln!(out, "{} has no values", column)?,
        },
        Outcome::Write { status } => match status {
            WriteStatus::Written(p) => writeln!(out, "Wrote {}", p.display())?,
            WriteStatus::AlreadyExists(p) => {
                writeln!(out, "{} already exists; left unchanged", p.display())?
            }
        },
        Outcome::Reloaded { rows } => writeln!(out, "Reloaded {} rows", rows)?,
        Outcome::Profile { columns } => {
            let mut t = boxed(&["Column", "Type", "Filled", "Missing"]);
            for c in columns {
                t.add_row(PtRow::new(vec![
                    Cell::new(&c.column),
                    Cell::new(c.ty.as_str()),
                    Cell::new(&c.filled.to_string()).style_spec("r"),
                    Cell::new(&c.missing.to_string()).style_spec("r"),
                ]));
            }
            t.print(out)?;
        }
        Outcome::Fit { x, y, fit } => match fit {
            Some(f) => {
                writeln!(
                    out,
                    "{} = {} * {} + {} over {} rows",
                    y,
                    format_number(f.slope),
                    x,
                    format_number(f.intercept),
                    f.pairs
                )?;
                if let Some(r) = f.r {
                    writeln!(out, "Correlation: {}", format_number(r))?;
                }
                writeln!(out, "As {} increases, {} {}.", x, y, f.direction())?;
            }
            None => writeln!(out, "Not enough varied data to fit {} against {}", y, x)?,
        },
    }
    Ok(())
}

fn print_table<W: Write>(out: &mut W, table: &Table, date_format: &str) -> Result<()> {
    let mut t = boxed(&table.column_names()[..]);
    for row in table.rows() {
        t.add_row(PtRow::new(
            row.values()
                .iter()
                .map(|v| Cell::new(&v.render(date_format)))
                .collect(),
        ));
    }
    t.print(out)?;
    writeln!(out, "{} rows", table.len())?;
    Ok(())
}

fn boxed<S: AsRef<str>>(header: &[S]) -> PtTable {
    let mut t = PtTable::new();
    t.set_format(*format::consts::FORMAT_BOX_CHARS);
    t.add_row(PtRow::new(
        header
            .iter()
            .map(|h| Cell::new(h.as_ref()).style_spec("bFg"))
            .collect(),
    ));
    t
}

/// Whole numbers without a fraction, everything else to two places.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}
