use anyhow::{anyhow, Result};
use colored::*;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{self, Write};

/// Herramienta interactiva para probar el backend de despacho a mano
struct Session {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    technician: Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("{}", "🛠️ Field Dispatch Testing Tool".bright_blue().bold());
    println!("{}", "=====================================".bright_blue());
    println!();

    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    println!("{} {}", "🌐 API:".bright_blue(), base_url);

    let client = Client::new();
    check_health(&client, &base_url).await?;

    // Paso 1: Pedir credenciales y autenticarse
    let (email, password) = get_credentials()?;
    let session = authenticate(client, base_url, &email, &password).await?;

    // Paso 2: Menú principal
    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🎫 Listar issues abiertos");
        println!("2. 🧭 Sugerir técnico para un issue");
        println!("3. 🗺️ Overlay de rutas");
        println!("4. 📤 Exportar CSV");
        println!("5. 🚪 Salir");
        let choice = prompt("Selecciona una opción (1-5): ")?;

        let result = match choice.as_str() {
            "1" => list_open_issues(&session).await,
            "2" => suggest_technician(&session).await,
            "3" => show_routes(&session).await,
            "4" => export_csv(&session).await,
            "5" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
                continue;
            }
        };

        if let Err(e) = result {
            println!("{} {}", "❌ Error:".bright_red(), e);
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label.bright_yellow());
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn get_credentials() -> Result<(String, String)> {
    println!();
    println!("{}", "🔐 CREDENCIALES".bright_cyan().bold());
    println!("{}", "===============".bright_cyan());
    let email = prompt("Email: ")?;
    let password = prompt("Password: ")?;
    Ok((email, password))
}

async fn check_health(client: &Client, base_url: &str) -> Result<()> {
    let response = client.get(format!("{}/health", base_url)).send().await?;
    let body: Value = response.json().await?;
    println!(
        "{} {} v{}",
        "✅ Backend disponible:".bright_green(),
        body["service"].as_str().unwrap_or("?"),
        body["version"].as_str().unwrap_or("?")
    );
    Ok(())
}

async fn authenticate(client: Client, base_url: String, email: &str, password: &str) -> Result<Session> {
    let response = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;

    if !response.status().is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        return Err(anyhow!("Login fallido: {}", body["message"]));
    }

    let envelope: LoginEnvelope = response.json().await?;
    println!(
        "{} {} ({})",
        "✅ Autenticado como".bright_green(),
        envelope.data.technician["full_name"].as_str().unwrap_or("?"),
        envelope.data.technician["role"].as_str().unwrap_or("?")
    );

    Ok(Session {
        client,
        base_url,
        token: envelope.data.token,
    })
}

impl Session {
    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.get(path).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;
        if !status.is_success() {
            return Err(anyhow!("{} → {}: {}", path, status, body["message"]));
        }
        Ok(body)
    }
}

async fn list_open_issues(session: &Session) -> Result<()> {
    for status in ["pending", "assigned", "in_progress"] {
        let issues = session.get_json(&format!("/api/issues?status={}&limit=50", status)).await?;
        let issues = issues.as_array().cloned().unwrap_or_default();
        println!("{} {} ({})", "📌".bright_blue(), status.bright_blue().bold(), issues.len());
        for issue in issues {
            println!(
                "   {} · {} · {} · {}",
                issue["id"].as_str().unwrap_or("?"),
                issue["vehicle_no"].as_str().unwrap_or("?"),
                issue["priority"].as_str().unwrap_or("?"),
                issue["problem"].as_str().unwrap_or("?")
            );
        }
    }
    Ok(())
}

async fn suggest_technician(session: &Session) -> Result<()> {
    let issue_id = prompt("ID del issue: ")?;
    let body = session
        .get_json(&format!("/api/dispatch/issues/{}/suggestion", issue_id))
        .await?;

    if body["outcome"] == "no_candidates" {
        println!("{}", "🤷 No hay técnicos en turno con ubicación".bright_yellow());
        return Ok(());
    }

    for (position, ranked) in body["ranking"].as_array().cloned().unwrap_or_default().iter().enumerate() {
        let line = format!(
            "{}. {} - {:.2} km",
            position + 1,
            ranked["full_name"].as_str().unwrap_or("?"),
            ranked["distance_km"].as_f64().unwrap_or_default()
        );
        if position == 0 {
            println!("{}", line.bright_green().bold());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn show_routes(session: &Session) -> Result<()> {
    let body = session.get_json("/api/dispatch/routes").await?;
    println!(
        "{} {} por carretera, {} en línea recta",
        "🗺️".bright_blue(),
        body["road_routes"],
        body["fallbacks"]
    );
    for route in body["routes"].as_array().cloned().unwrap_or_default() {
        let path = &route["path"];
        let detail = match path["kind"].as_str() {
            Some("road") => path["label"].as_str().unwrap_or("?").to_string(),
            _ => "línea recta".to_string(),
        };
        println!(
            "   {} → {} : {}",
            route["technician_name"].as_str().unwrap_or("?"),
            route["issue_id"].as_str().unwrap_or("?"),
            detail
        );
    }
    Ok(())
}

async fn export_csv(session: &Session) -> Result<()> {
    let response = session.get("/api/issues/export").send().await?;
    if !response.status().is_success() {
        return Err(anyhow!("Exportación fallida: {}", response.status()));
    }
    let csv = response.text().await?;
    let path = "issues_export.csv";
    std::fs::write(path, &csv)?;
    println!(
        "{} {} filas guardadas en {}",
        "✅".bright_green(),
        csv.lines().count().saturating_sub(1),
        path
    );
    Ok(())
}
