use std::net::SocketAddr;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

use field_dispatch::config::EnvironmentConfig;
use field_dispatch::database::DatabaseConnection;
use field_dispatch::{create_app_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level()?)
        .init();

    info!("🛠️ Field Dispatch - Backend de servicio técnico");
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new_default().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    db_connection.run_migrations().await?;

    let pool = db_connection.pool().clone();

    if config.messaging_url.is_none() {
        info!("📭 MESSAGING_URL no configurado: alertas deshabilitadas");
    }
    if config.storage_upload_url.is_none() {
        info!("📭 STORAGE_UPLOAD_URL no configurado: subidas deshabilitadas");
    }

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(pool, config)?;
    let app = create_app_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🔑 Auth:");
    info!("   POST /api/auth/login - Login de técnico");
    info!("   GET  /api/auth/me - Técnico actual");
    info!("   CRUD /api/technicians - Gestión de técnicos (admin)");
    info!("🎫 Issues:");
    info!("   GET/POST /api/issues - Listar / crear issues");
    info!("   GET  /api/issues/stats - Conteos por estado y prioridad");
    info!("   GET  /api/issues/export - Exportar CSV");
    info!("   POST /api/issues/import - Importar CSV");
    info!("   POST /api/issues/:id/assign - Asignar técnico");
    info!("   POST /api/issues/:id/status - Cambiar estado");
    info!("🧭 Despacho:");
    info!("   GET  /api/dispatch/issues/:id/suggestion - Técnico más cercano");
    info!("   POST /api/dispatch/issues/:id/auto-assign - Auto-asignar");
    info!("   POST /api/dispatch/rank - Ranking por coordenada");
    info!("   GET  /api/dispatch/routes - Overlay de rutas");
    info!("👷 Operación de campo:");
    info!("   /api/attendance, /api/locations, /api/inventory, /api/invoices, /api/notifications");
    info!("📤 Integraciones:");
    info!("   POST /api/uploads/image, /api/uploads/signature, /api/alerts");
    info!("📡 Tiempo real:");
    info!("   GET  /api/realtime/issues - SSE de cambios");

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    // Esperar a que el servidor termine
    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
