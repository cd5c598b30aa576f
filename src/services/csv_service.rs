//! Importación y exportación CSV de issues
//!
//! Cabecera fija; la exportación entrecomilla todos los campos. La importación
//! acepta las columnas en cualquier orden, ignora columnas desconocidas,
//! normaliza `vehicle_no` a mayúsculas y reporta errores por fila sin abortar.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::issue::{Issue, IssuePriority, IssueStatus};
use crate::services::issue_lifecycle::imported_lifecycle;
use crate::utils::errors::AppError;
use crate::utils::validation::{normalize_vehicle_no, validate_coordinate_pair, validate_vehicle_no};

pub const CSV_HEADER: [&str; 10] = [
    "client",
    "vehicle_no",
    "device_imei",
    "problem",
    "priority",
    "status",
    "latitude",
    "longitude",
    "location_text",
    "created_at",
];

/// Fila válida lista para insertar
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedIssue {
    pub client: String,
    pub vehicle_no: String,
    pub device_imei: Option<String>,
    pub problem: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_text: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvRowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub rows: Vec<(usize, ImportedIssue)>,
    pub errors: Vec<CsvRowError>,
}

/// Resumen devuelto al cliente tras importar
#[derive(Debug, Serialize)]
pub struct CsvImportSummary {
    pub imported: usize,
    pub skipped: Vec<CsvRowError>,
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn write_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    let line: Vec<String> = fields.into_iter().map(quote).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// Exportar issues con cabecera fija, todos los campos entrecomillados
pub fn export_issues(issues: &[Issue]) -> String {
    let mut out = String::new();
    write_record(&mut out, CSV_HEADER);

    for issue in issues {
        let latitude = issue.latitude.map(|v| v.to_string()).unwrap_or_default();
        let longitude = issue.longitude.map(|v| v.to_string()).unwrap_or_default();
        let created_at = issue.created_at.to_rfc3339();
        write_record(
            &mut out,
            [
                issue.client.as_str(),
                issue.vehicle_no.as_str(),
                issue.device_imei.as_deref().unwrap_or(""),
                issue.problem.as_str(),
                issue.priority.as_str(),
                issue.status.as_str(),
                latitude.as_str(),
                longitude.as_str(),
                issue.location_text.as_deref().unwrap_or(""),
                created_at.as_str(),
            ],
        );
    }

    out
}

/// Registro crudo con la línea (1-based) donde empieza
#[derive(Debug, PartialEq)]
struct RawRecord {
    line: usize,
    fields: Vec<String>,
}

/// Tokenizador CSV: comillas dobles, comillas escapadas y saltos de línea dentro de comillas
fn parse_records(text: &str) -> Result<Vec<RawRecord>, AppError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(RawRecord {
                    line: record_line,
                    fields: std::mem::take(&mut fields),
                });
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::BadRequest(format!(
            "CSV inválido: comillas sin cerrar en la línea {}",
            record_line
        )));
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(RawRecord {
            line: record_line,
            fields,
        });
    }

    // Líneas en blanco no son registros
    records.retain(|r| !(r.fields.len() == 1 && r.fields[0].trim().is_empty()));
    Ok(records)
}

struct ColumnMap {
    indexes: [Option<usize>; CSV_HEADER.len()],
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self, AppError> {
        let mut indexes = [None; CSV_HEADER.len()];
        for (position, name) in header.iter().enumerate() {
            let name = name.trim().to_lowercase();
            if let Some(column) = CSV_HEADER.iter().position(|h| *h == name) {
                indexes[column].get_or_insert(position);
            }
        }

        for required in ["client", "vehicle_no", "problem"] {
            let column = CSV_HEADER.iter().position(|h| *h == required).unwrap_or_default();
            if indexes[column].is_none() {
                return Err(AppError::BadRequest(format!(
                    "CSV inválido: falta la columna '{}' en la cabecera",
                    required
                )));
            }
        }

        Ok(Self { indexes })
    }

    fn get<'a>(&self, record: &'a RawRecord, column: &str) -> Option<&'a str> {
        let column = CSV_HEADER.iter().position(|h| *h == column)?;
        let index = self.indexes[column]?;
        record
            .fields
            .get(index)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn parse_row(columns: &ColumnMap, record: &RawRecord, now: DateTime<Utc>) -> Result<ImportedIssue, String> {
    let client = columns
        .get(record, "client")
        .ok_or("client es requerido")?
        .to_string();

    let vehicle_no = normalize_vehicle_no(columns.get(record, "vehicle_no").ok_or("vehicle_no es requerido")?);
    validate_vehicle_no(&vehicle_no).map_err(|_| format!("vehicle_no inválido: {}", vehicle_no))?;

    let problem = columns
        .get(record, "problem")
        .ok_or("problem es requerido")?
        .to_string();

    let priority = match columns.get(record, "priority") {
        Some(raw) => IssuePriority::parse(raw).ok_or_else(|| format!("priority inválida: {}", raw))?,
        None => IssuePriority::Medium,
    };

    let status = match columns.get(record, "status") {
        Some(raw) => IssueStatus::parse(raw).ok_or_else(|| format!("status inválido: {}", raw))?,
        None => IssueStatus::Pending,
    };

    let parse_coord = |name: &str| -> Result<Option<f64>, String> {
        columns
            .get(record, name)
            .map(|raw| raw.parse::<f64>().map_err(|_| format!("{} inválida: {}", name, raw)))
            .transpose()
    };
    let latitude = parse_coord("latitude")?;
    let longitude = parse_coord("longitude")?;
    validate_coordinate_pair(latitude, longitude).map_err(|e| format!("coordenadas inválidas: {}", e.code))?;

    let created_at = columns
        .get(record, "created_at")
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| format!("created_at inválido: {}", raw))
        })
        .transpose()?;

    let lifecycle = imported_lifecycle(status, created_at, now);
    if lifecycle.status != status {
        log::info!(
            "ℹ️ Fila CSV {}: {} sin técnico se importa como {}",
            record.line,
            status.as_str(),
            lifecycle.status.as_str()
        );
    }

    Ok(ImportedIssue {
        client,
        vehicle_no,
        device_imei: columns.get(record, "device_imei").map(str::to_string),
        problem,
        priority,
        status: lifecycle.status,
        latitude,
        longitude,
        location_text: columns.get(record, "location_text").map(str::to_string),
        created_at,
        started_at: lifecycle.started_at,
        completed_at: lifecycle.completed_at,
    })
}

/// Parsear un CSV de issues. Error solo si la estructura del archivo es inválida.
pub fn parse_issue_csv(text: &str) -> Result<ParsedImport, AppError> {
    let mut records = parse_records(text)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| AppError::BadRequest("CSV vacío: se esperaba una cabecera".to_string()))?;
    let columns = ColumnMap::from_header(&header.fields)?;

    let now = Utc::now();
    let mut parsed = ParsedImport::default();
    for record in records {
        match parse_row(&columns, &record, now) {
            Ok(issue) => parsed.rows.push((record.line, issue)),
            Err(message) => {
                log::warn!("⚠️ Fila CSV {} descartada: {}", record.line, message);
                parsed.errors.push(CsvRowError {
                    line: record.line,
                    message,
                });
            }
        }
    }

    log::info!("📄 CSV parseado: {} filas válidas, {} con errores", parsed.rows.len(), parsed.errors.len());
    Ok(parsed)
}

impl ParsedImport {
    /// Vehículos con alguna fila abierta, para consultar sus issues abiertos
    pub fn open_vehicle_numbers(&self) -> Vec<String> {
        let mut vehicles: Vec<String> = self
            .rows
            .iter()
            .filter(|(_, row)| row.status.is_open())
            .map(|(_, row)| row.vehicle_no.clone())
            .collect();
        vehicles.sort();
        vehicles.dedup();
        vehicles
    }

    /// Descartar filas abiertas de un vehículo que ya tiene un issue abierto,
    /// en la base de datos o en una fila anterior del mismo archivo
    pub fn reject_open_duplicates(&mut self, already_open: &HashSet<String>) {
        let mut seen: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(self.rows.len());

        for (line, row) in std::mem::take(&mut self.rows) {
            if !row.status.is_open() {
                kept.push((line, row));
                continue;
            }

            let conflict = if already_open.contains(&row.vehicle_no) {
                Some(format!("el vehículo {} ya tiene un issue abierto", row.vehicle_no))
            } else if !seen.insert(row.vehicle_no.clone()) {
                Some(format!(
                    "el vehículo {} ya tiene un issue abierto en una fila anterior",
                    row.vehicle_no
                ))
            } else {
                None
            };

            match conflict {
                Some(message) => {
                    log::warn!("⚠️ Fila CSV {} descartada: {}", line, message);
                    self.errors.push(CsvRowError { line, message });
                }
                None => kept.push((line, row)),
            }
        }

        self.rows = kept;
        self.errors.sort_by_key(|e| e.line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_issue() -> Issue {
        let now = Utc::now();
        Issue {
            id: Uuid::new_v4(),
            client: "Baba Travels".to_string(),
            vehicle_no: "MH231FC9072".to_string(),
            device_imei: Some("864893030123456".to_string()),
            problem: "Tracker offline, \"urgent\" per client, check wiring".to_string(),
            priority: IssuePriority::High,
            status: IssueStatus::Assigned,
            latitude: Some(18.5204),
            longitude: Some(73.8567),
            location_text: Some("Swargate, Pune".to_string()),
            assigned_to: None,
            photo_url: None,
            signature_url: None,
            resolution_notes: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_export_quotes_every_field() {
        let csv = export_issues(&[sample_issue()]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"client\",\"vehicle_no\",\"device_imei\",\"problem\",\"priority\",\"status\",\"latitude\",\"longitude\",\"location_text\",\"created_at\""
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Baba Travels\",\"MH231FC9072\","));
        assert!(row.contains("\"Tracker offline, \"\"urgent\"\" per client, check wiring\""));
    }

    #[test]
    fn test_export_then_import_roundtrip() {
        let original = sample_issue();
        let csv = export_issues(&[original.clone()]);

        let parsed = parse_issue_csv(&csv).unwrap();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.rows.len(), 1);

        let (line, imported) = &parsed.rows[0];
        assert_eq!(*line, 2);
        assert_eq!(imported.client, "Baba Travels");
        assert_eq!(imported.vehicle_no, "MH231FC9072");
        assert_eq!(imported.problem, original.problem);
        assert_eq!(imported.priority, IssuePriority::High);
        assert_eq!(imported.status, IssueStatus::Pending);
        assert_eq!(imported.latitude, Some(18.5204));
        assert_eq!(imported.longitude, Some(73.8567));
        assert_eq!(
            imported.created_at.map(|d| d.timestamp()),
            Some(original.created_at.timestamp())
        );
    }

    #[test]
    fn test_import_uppercases_vehicle_no_and_applies_defaults() {
        let csv = "vehicle_no,client,problem,extra\nmh231fc9072,Baba Travels,No power,ignored\n";
        let parsed = parse_issue_csv(csv).unwrap();
        let (_, imported) = &parsed.rows[0];
        assert_eq!(imported.vehicle_no, "MH231FC9072");
        assert_eq!(imported.priority, IssuePriority::Medium);
        assert_eq!(imported.status, IssueStatus::Pending);
        assert_eq!(imported.latitude, None);
        assert_eq!(imported.device_imei, None);
    }

    #[test]
    fn test_import_reports_bad_rows_and_keeps_good_ones() {
        let csv = "client,vehicle_no,problem,priority,latitude,longitude\n\
                   Baba Travels,MH12AB1234,GPS,critical,,\n\
                   Sai Cabs,MH14XY9999,Relay fault,low,18.5,\n\
                   Om Logistics,MH04CD5555,Battery drain,urgent,18.5,73.8\n";
        let parsed = parse_issue_csv(csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].1.client, "Om Logistics");
        let lines: Vec<_> = parsed.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn test_quoted_newline_and_crlf() {
        let csv = "client,vehicle_no,problem\r\n\"Baba, Travels\",MH231FC9072,\"line one\nline two\"\r\n\r\nSai Cabs,MH14XY9999,Relay\r\n";
        let parsed = parse_issue_csv(csv).unwrap();
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].1.client, "Baba, Travels");
        assert_eq!(parsed.rows[0].1.problem, "line one\nline two");
        assert_eq!(parsed.rows[1].0, 5);
    }

    #[test]
    fn test_missing_required_header_is_error() {
        assert!(parse_issue_csv("client,problem\nBaba,GPS\n").is_err());
        assert!(parse_issue_csv("").is_err());
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert!(parse_issue_csv("client,vehicle_no,problem\n\"Baba,MH12,GPS\n").is_err());
    }

    #[test]
    fn test_import_never_leaves_open_issue_without_technician() {
        let csv = "client,vehicle_no,problem,status\n\
                   Baba Travels,MH231FC9072,GPS,in_progress\n\
                   Sai Cabs,MH14XY9999,Relay,assigned\n";
        let parsed = parse_issue_csv(csv).unwrap();
        assert!(parsed.errors.is_empty());
        for (_, row) in &parsed.rows {
            assert_eq!(row.status, IssueStatus::Pending);
            assert_eq!(row.started_at, None);
        }
    }

    #[test]
    fn test_import_stamps_completed_rows() {
        let csv = "client,vehicle_no,problem,status,created_at\n\
                   Baba Travels,MH231FC9072,GPS,completed,2024-03-01T09:30:00Z\n";
        let parsed = parse_issue_csv(csv).unwrap();
        let (_, row) = &parsed.rows[0];
        assert_eq!(row.status, IssueStatus::Completed);
        assert_eq!(row.started_at, row.created_at);
        assert!(row.completed_at.is_some());
        assert!(row.completed_at >= row.started_at);
    }

    #[test]
    fn test_import_rejects_open_duplicates_in_file_and_database() {
        let csv = "client,vehicle_no,problem,status\n\
                   Baba Travels,MH231FC9072,GPS,pending\n\
                   Baba Travels,mh231fc9072,Relay,pending\n\
                   Sai Cabs,MH14XY9999,Battery,pending\n\
                   Om Logistics,MH04CD5555,Wiring,pending\n\
                   Om Logistics,MH04CD5555,Old ticket,completed\n";
        let mut parsed = parse_issue_csv(csv).unwrap();
        assert_eq!(
            parsed.open_vehicle_numbers(),
            vec!["MH04CD5555", "MH14XY9999", "MH231FC9072"]
        );

        let already_open: HashSet<String> = ["MH14XY9999".to_string()].into_iter().collect();
        parsed.reject_open_duplicates(&already_open);

        let kept: Vec<usize> = parsed.rows.iter().map(|(line, _)| *line).collect();
        assert_eq!(kept, vec![2, 5, 6]);
        let rejected: Vec<usize> = parsed.errors.iter().map(|e| e.line).collect();
        assert_eq!(rejected, vec![3, 4]);
        assert!(parsed.errors[0].message.contains("fila anterior"));
    }
}
