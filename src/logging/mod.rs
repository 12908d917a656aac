use std::io::Write;
use std::time::Instant;

/// 初始化日志系统
///
/// 默认 Info 级别，`verbose` 时为 Debug；设置了 `RUST_LOG` 时以其为准。
/// 日志输出到 stderr，stdout 只留给运行摘要。
pub fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder
        .format(|buf, record| {
            let level_style = match record.level() {
                log::Level::Error => "\x1b[31m", // 红色
                log::Level::Warn => "\x1b[33m",  // 黄色
                log::Level::Info => "\x1b[32m",  // 绿色
                log::Level::Debug => "\x1b[36m", // 青色
                log::Level::Trace => "\x1b[90m", // 灰色
            };

            writeln!(
                buf,
                "{}{} [{}] {}\x1b[0m",
                level_style,
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// 阶段计时器，完成时在 debug 级别记录耗时
pub struct StageTimer {
    start: Instant,
    stage: &'static str,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        log::debug!("Stage '{stage}' started");
        Self {
            start: Instant::now(),
            stage,
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    /// 完成计时并记录日志
    pub fn finish(self) {
        log::debug!(
            "Stage '{}' finished in {} ms",
            self.stage,
            self.elapsed().as_millis()
        );
    }
}

/// 计时执行一个阶段
#[macro_export]
macro_rules! timed_stage {
    ($stage:expr, $block:block) => {{
        let timer = $crate::logging::StageTimer::new($stage);
        let result = $block;
        timer.finish();
        result
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_timer() {
        let timer = StageTimer::new("load");
        assert_eq!(timer.stage, "load");
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(timer.elapsed().as_nanos() > 0);
        timer.finish();
    }

    #[test]
    fn test_timed_stage_returns_block_value() {
        let value = crate::timed_stage!("compute", { 40 + 2 });
        assert_eq!(value, 42);
    }
}
