use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::DispatchService;
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::errors::{Result, SchedulerError};
use crate::models::schedules::entities::{Schedule, ScheduleState};
use crate::models::schedules::requests::UpdateScheduleRequest;
use crate::models::schedules::responses::DispatchResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduling::time_grid::WorkInterval;
use crate::scheduling::{contract, lifecycle, preference};
use crate::services::schedules::get::load_active_schedule;
use crate::services::schedules::update::refresh_schedule_cache;
use crate::storage::Storage;

/// 诊断输出尾部缓冲，只保留最后 cap 字节
struct TailBuffer {
    cap: usize,
    buf: VecDeque<u8>,
}

impl TailBuffer {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            buf: VecDeque::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        self.buf.extend(line.as_bytes());
        self.buf.push_back(b'\n');
        while self.buf.len() > self.cap {
            self.buf.pop_front();
        }
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.iter().copied().collect::<Vec<u8>>()).into_owned()
    }
}

async fn stream_lines<R>(reader: R, tail: Arc<Mutex<TailBuffer>>, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        if is_stderr {
            error!("[ALGORITHM ERR] {}", line);
        } else {
            info!("[ALGORITHM] {}", line);
        }
        tail.lock()
            .expect("Tail buffer lock poisoned")
            .push_line(&line);
    }
}

/// 外部分配算法的进程包装
///
/// 算法不接收参数：它从共享存储读取 TA 与活动排班，把结果
/// 合并写回同一存储。这里只负责运行、限时、流式转发输出
pub struct AlgorithmRunner {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: String,
    pub timeout: Duration,
    pub capture_bytes: usize,
}

/// 算法进程的正常结束产物
#[derive(Debug)]
pub struct AlgorithmOutput {
    pub tail: String,
}

impl AlgorithmRunner {
    pub fn from_config() -> Self {
        let config = AppConfig::get();
        Self {
            command: config.algorithm.command.clone(),
            args: config.algorithm.args.clone(),
            working_dir: config.algorithm.working_dir.clone(),
            timeout: Duration::from_secs(config.algorithm.timeout_secs),
            capture_bytes: config.algorithm.output_capture_bytes,
        }
    }

    /// 运行到结束或超时
    ///
    /// 非零退出、派生失败、超时都返回 DispatchFailure 并携带
    /// 已捕获的诊断尾部；超时会杀掉子进程
    pub async fn run(&self, run_id: Uuid) -> Result<AlgorithmOutput> {
        info!(
            "[{}] Launching algorithm process: {} {:?}",
            run_id, self.command, self.args
        );

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !self.working_dir.is_empty() {
            command.current_dir(&self.working_dir);
        }

        let mut child = command.spawn().map_err(|e| {
            SchedulerError::dispatch_failure(format!(
                "Failed to spawn algorithm process '{}': {e}",
                self.command
            ))
        })?;

        let tail = Arc::new(Mutex::new(TailBuffer::new(self.capture_bytes)));
        let stdout = child.stdout.take().expect("Algorithm stdout piped");
        let stderr = child.stderr.take().expect("Algorithm stderr piped");
        let stdout_task = tokio::spawn(stream_lines(stdout, tail.clone(), false));
        let stderr_task = tokio::spawn(stream_lines(stderr, tail.clone(), true));

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(SchedulerError::dispatch_failure(format!(
                    "Failed to wait for algorithm process: {e}"
                )));
            }
            Err(_) => {
                warn!(
                    "[{}] Algorithm exceeded {}s timeout, killing process",
                    run_id,
                    self.timeout.as_secs()
                );
                child.kill().await.ok();
                let _ = stdout_task.await;
                let _ = stderr_task.await;
                let captured = tail.lock().expect("Tail buffer lock poisoned").contents();
                return Err(SchedulerError::dispatch_failure(format!(
                    "Algorithm timed out after {}s\n{captured}",
                    self.timeout.as_secs()
                )));
            }
        };

        let _ = stdout_task.await;
        let _ = stderr_task.await;
        let captured = tail.lock().expect("Tail buffer lock poisoned").contents();

        info!("[{}] Algorithm process exited with {:?}", run_id, status.code());

        if status.success() {
            Ok(AlgorithmOutput { tail: captured })
        } else {
            Err(SchedulerError::dispatch_failure(format!(
                "Algorithm exited with code {:?}\n{captured}",
                status.code()
            )))
        }
    }
}

/// 失败回退：恢复调度前的天数组，状态回到 Populated
async fn rollback_dispatch(
    storage: &Arc<dyn Storage>,
    cache: &Arc<dyn ObjectCache>,
    snapshot: &Schedule,
) {
    let update =
        UpdateScheduleRequest::replace_days_with_state(snapshot, ScheduleState::Populated);
    match storage
        .merge_update_schedule(snapshot.schedule_id, update)
        .await
    {
        Ok(Some(schedule)) => {
            warn!(
                "Schedule {} rolled back to populated after failed dispatch",
                schedule.schedule_id
            );
            refresh_schedule_cache(cache, &schedule).await;
        }
        Ok(None) => error!(
            "Rollback failed: schedule {} vanished during dispatch",
            snapshot.schedule_id
        ),
        Err(e) => error!("Rollback failed for schedule {}: {}", snapshot.schedule_id, e),
    }
}

pub async fn run_algorithm(
    service: &DispatchService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);
    let run_id = Uuid::new_v4();

    // 1. 活动排班必须存在且处于 Populated
    let mut schedule = match load_active_schedule(&storage, &cache).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ScheduleNotFound,
                "No schedules found",
            )));
        }
        Err(e) => {
            error!("Failed to load active schedule: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while loading active schedule",
                )),
            );
        }
    };

    if let Err(e) = lifecycle::transition(&mut schedule, ScheduleState::Dispatched) {
        return Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::IllegalTransition, e.message().to_string())));
    }

    // 2. 偏好绑定并落库：算法从存储读到的已是绑定后的状态
    let mut tas = match storage.list_tas().await {
        Ok(tas) => tas,
        Err(e) => {
            error!("Failed to list TAs: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while listing TAs",
                )),
            );
        }
    };

    // 算法假定每个 TA 的偏好向量是稠密的：未声明的时段补不可用
    let interval = match WorkInterval::from_schedule(&schedule) {
        Ok(interval) => interval,
        Err(e) => {
            error!("Active schedule carries a corrupt interval: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Active schedule configuration is corrupt",
            )));
        }
    };
    for ta in &mut tas {
        ta.preferences = preference::densify(&ta.preferences, &interval);
    }

    if let Err(e) = contract::resolve_shift_ids(&schedule, &mut tas) {
        error!("Shift id resolution failed: {}", e);
        return Ok(HttpResponse::InternalServerError()
            .json(ApiResponse::error_empty(ErrorCode::InternalServerError, e.format_simple())));
    }
    for ta in &tas {
        if let Err(e) = storage
            .replace_ta_preferences(&ta.ta_id, ta.preferences.clone())
            .await
        {
            error!("Failed to persist resolved preferences for {}: {}", ta.ta_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to persist resolved preferences: {e}"),
            )));
        }
    }

    let payload = contract::build_request(&schedule, &tas);
    debug!(
        "[{}] Assignment request: {} TA offers, {} shift demands",
        run_id,
        payload.tas.len(),
        payload.shifts.len()
    );

    // 3. 调度前快照（回退与校验的基准），持久化 Dispatched 状态
    let snapshot = schedule.clone();
    match storage
        .merge_update_schedule(
            snapshot.schedule_id,
            UpdateScheduleRequest {
                state: Some(ScheduleState::Dispatched),
                ..Default::default()
            },
        )
        .await
    {
        Ok(Some(schedule)) => refresh_schedule_cache(&cache, &schedule).await,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ScheduleNotFound,
                "Schedule disappeared before dispatch",
            )));
        }
        Err(e) => {
            error!("Failed to mark schedule dispatched: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to mark schedule dispatched: {e}"),
            )));
        }
    }

    // 4. 运行算法进程
    let runner = AlgorithmRunner::from_config();
    let output = match runner.run(run_id).await {
        Ok(output) => output,
        Err(e) => {
            error!("[{}] Dispatch failed: {}", run_id, e.message());
            rollback_dispatch(&storage, &cache, &snapshot).await;
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::DispatchFailure,
                e.message().to_string(),
            )));
        }
    };

    // 5. 重新读取算法写回的文档并整体校验
    let rewritten = match storage.get_schedule_by_id(snapshot.schedule_id).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => {
            error!("[{}] Schedule vanished while algorithm was running", run_id);
            rollback_dispatch(&storage, &cache, &snapshot).await;
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::DispatchFailure,
                "Schedule vanished while algorithm was running",
            )));
        }
        Err(e) => {
            error!("[{}] Failed to re-read schedule: {}", run_id, e);
            rollback_dispatch(&storage, &cache, &snapshot).await;
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::DispatchFailure,
                format!("Failed to re-read schedule: {e}"),
            )));
        }
    };

    let result = contract::AssignmentResult::from_schedule_document(&rewritten);
    let validated = match contract::validate(&result, &snapshot, &tas) {
        Ok(validated) => validated,
        Err(e) => {
            // 违约不等于进程失败，单独上报并整体作废
            error!("[{}] Contract violation: {}", run_id, e.message());
            rollback_dispatch(&storage, &cache, &snapshot).await;
            return Ok(HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
                ErrorCode::ContractViolation,
                e.message().to_string(),
            )));
        }
    };

    // 6. 写回：快照为基底，占用集合取校验后的结果
    let mut published = snapshot.clone();
    let affected = contract::write_back(&mut published, &validated, &mut tas);
    if let Err(e) = lifecycle::transition(&mut published, ScheduleState::Published) {
        error!("[{}] Unexpected lifecycle failure on publish: {}", run_id, e);
        rollback_dispatch(&storage, &cache, &snapshot).await;
        return Ok(HttpResponse::InternalServerError()
            .json(ApiResponse::error_empty(ErrorCode::InternalServerError, e.format_simple())));
    }

    let update = UpdateScheduleRequest::replace_days_with_state(&published, published.state);
    let published = match storage
        .merge_update_schedule(published.schedule_id, update)
        .await
    {
        Ok(Some(schedule)) => schedule,
        Ok(None) => {
            error!("[{}] Schedule vanished during write-back", run_id);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Schedule vanished during write-back",
            )));
        }
        Err(e) => {
            error!("[{}] Write-back failed: {}", run_id, e);
            rollback_dispatch(&storage, &cache, &snapshot).await;
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Write-back failed: {e}"),
            )));
        }
    };

    for ta in &tas {
        if let Err(e) = storage
            .replace_ta_confirmed_shifts(&ta.ta_id, ta.confirmed_shifts.clone())
            .await
        {
            error!("Failed to persist confirmed shifts for {}: {}", ta.ta_id, e);
        }
    }

    refresh_schedule_cache(&cache, &published).await;

    info!(
        "[{}] Schedule {} published: {} shifts assigned",
        run_id, published.schedule_id, affected
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        DispatchResponse {
            schedule_id: published.schedule_id,
            state: published.state,
            assigned_shifts: affected,
            output: output.tail,
        },
        "Algorithm completed successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(command: &str, args: &[&str], timeout_ms: u64) -> AlgorithmRunner {
        AlgorithmRunner {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            working_dir: String::new(),
            timeout: Duration::from_millis(timeout_ms),
            capture_bytes: 2000,
        }
    }

    #[tokio::test]
    async fn test_run_captures_output_on_success() {
        let runner = runner("sh", &["-c", "echo scheduling done"], 5000);
        let output = runner.run(Uuid::new_v4()).await.unwrap();
        assert!(output.tail.contains("scheduling done"));
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_is_dispatch_failure() {
        let runner = runner("sh", &["-c", "echo boom >&2; exit 3"], 5000);
        let err = runner.run(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::DispatchFailure(_)));
        assert!(err.message().contains("3"));
        assert!(err.message().contains("boom"));
    }

    #[tokio::test]
    async fn test_run_spawn_failure_is_dispatch_failure() {
        let runner = runner("definitely-not-a-real-binary-5712", &[], 5000);
        let err = runner.run(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::DispatchFailure(_)));
    }

    #[tokio::test]
    async fn test_run_timeout_kills_process() {
        let started = std::time::Instant::now();
        let runner = runner("sleep", &["5"], 200);
        let err = runner.run(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::DispatchFailure(_)));
        assert!(err.message().contains("timed out"));
        // 超时后立即返回，不等 sleep 跑完
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_tail_buffer_keeps_last_bytes() {
        let mut tail = TailBuffer::new(16);
        tail.push_line("first line of output");
        tail.push_line("tail");
        let contents = tail.contents();
        assert!(contents.len() <= 16);
        assert!(contents.contains("tail"));
        assert!(!contents.contains("first"));
    }

    mod rollback {
        use super::super::*;
        use std::collections::BTreeSet;
        use std::sync::Mutex;

        use crate::cache::CacheResult;
        use crate::models::shifts::entities::{ShiftRole, StaffingCapacity};
        use crate::models::tas::entities::{PreferenceEntry, RoleLevel, Ta};
        use crate::models::tas::requests::CreateTaRequest;
        use crate::scheduling::{catalog, time_grid::WorkInterval};
        use crate::storage::Storage;

        // 只支撑回退路径的存储替身
        struct SingleScheduleStorage {
            schedule: Mutex<Schedule>,
        }

        #[async_trait::async_trait]
        impl Storage for SingleScheduleStorage {
            async fn create_ta(&self, _ta: CreateTaRequest) -> crate::errors::Result<Ta> {
                unimplemented!("not used by rollback")
            }
            async fn get_ta_by_id(&self, _ta_id: &str) -> crate::errors::Result<Option<Ta>> {
                unimplemented!("not used by rollback")
            }
            async fn list_tas(&self) -> crate::errors::Result<Vec<Ta>> {
                Ok(vec![])
            }
            async fn replace_ta_preferences(
                &self,
                _ta_id: &str,
                _preferences: Vec<PreferenceEntry>,
            ) -> crate::errors::Result<bool> {
                Ok(true)
            }
            async fn replace_ta_confirmed_shifts(
                &self,
                _ta_id: &str,
                _confirmed_shifts: BTreeSet<String>,
            ) -> crate::errors::Result<bool> {
                Ok(true)
            }
            async fn replace_active_schedule(
                &self,
                schedule: Schedule,
            ) -> crate::errors::Result<Schedule> {
                *self.schedule.lock().unwrap() = schedule.clone();
                Ok(schedule)
            }
            async fn get_schedule_by_id(
                &self,
                schedule_id: i64,
            ) -> crate::errors::Result<Option<Schedule>> {
                let current = self.schedule.lock().unwrap().clone();
                Ok((current.schedule_id == schedule_id).then_some(current))
            }
            async fn get_latest_schedule(&self) -> crate::errors::Result<Option<Schedule>> {
                Ok(Some(self.schedule.lock().unwrap().clone()))
            }
            async fn merge_update_schedule(
                &self,
                schedule_id: i64,
                update: UpdateScheduleRequest,
            ) -> crate::errors::Result<Option<Schedule>> {
                let mut current = self.schedule.lock().unwrap();
                if current.schedule_id != schedule_id {
                    return Ok(None);
                }
                catalog::apply_merge_update(&mut current, update);
                Ok(Some(current.clone()))
            }
        }

        struct NoopCache;

        #[async_trait::async_trait]
        impl ObjectCache for NoopCache {
            async fn get_raw(&self, _key: &str) -> CacheResult<String> {
                CacheResult::NotFound
            }
            async fn insert_raw(&self, _key: String, _value: String, _ttl: u64) {}
            async fn remove(&self, _key: &str) {}
            async fn invalidate_all(&self) {}
        }

        fn populated_schedule() -> Schedule {
            let interval = WorkInterval::parse("09:00", "12:00", 90).unwrap();
            let mut schedule = catalog::generate(
                1,
                &interval,
                StaffingCapacity::new(RoleLevel::OhOnly, 2),
            );
            let mut slots = std::collections::HashMap::new();
            slots.insert("m-09:00".to_string(), ShiftRole::OfficeHours);
            catalog::apply_template(&mut schedule, &slots).unwrap();
            crate::scheduling::lifecycle::transition(&mut schedule, ScheduleState::Populated)
                .unwrap();
            schedule
        }

        #[tokio::test]
        async fn test_failed_dispatch_restores_populated_state_and_occupants() {
            // 调度前快照：Populated，占用为空
            let mut snapshot = populated_schedule();
            crate::scheduling::lifecycle::transition(&mut snapshot, ScheduleState::Dispatched)
                .unwrap();

            // 存储中是算法中途写坏的版本：状态 Dispatched，占用被改动
            let mut tampered = snapshot.clone();
            tampered.monday[0]
                .tas_scheduled
                .insert("ghost99".to_string());

            let storage: Arc<dyn Storage> = Arc::new(SingleScheduleStorage {
                schedule: Mutex::new(tampered),
            });
            let cache: Arc<dyn ObjectCache> = Arc::new(NoopCache);

            rollback_dispatch(&storage, &cache, &snapshot).await;

            let restored = storage.get_schedule_by_id(1).await.unwrap().unwrap();
            // 状态回到 Populated，占用恢复为调度前的空集合
            assert_eq!(restored.state, ScheduleState::Populated);
            assert!(restored.monday[0].tas_scheduled.is_empty());
            assert_eq!(restored.shift_duration, 90);
        }
    }
}
