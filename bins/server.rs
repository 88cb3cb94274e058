use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // 提前加载 .env，使得 RUST_LOG / LOG_FORMAT / DATABASE_URL 等环境变量生效
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
    info!(service = "todo", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "todo",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // 配置错误属于致命启动错误
    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "todo", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = cfg.server.worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "todo", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "todo",
        event = "start",
        %service_id,
        pid,
        version,
        threads = cfg.server.worker_threads.unwrap_or_default(),
        "todo service starting"
    );

    // Ctrl+C 由 server::run 内部的 graceful shutdown 处理
    rt.block_on(async move {
        match tokio::spawn(server::run(cfg)).await {
            Ok(Ok(())) => {
                info!(service = "todo", event = "stop", %service_id, pid, "server stopped normally");
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!(service = "todo", event = "run_failed", error = %e, "server::run returned error");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(service = "todo", event = "task_join_error", error = %e, "server task join error");
                ExitCode::FAILURE
            }
        }
    })
}
