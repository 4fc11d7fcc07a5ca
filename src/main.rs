#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use roster::clock::Clock;
use roster::error::FieldError;
use roster::export::{self, EMPLOYEES_CSV_FILENAME, REPORT_CSV_FILENAME};
use roster::live::{Dashboard, FeedItem};
use roster::notice::Notice;
use roster::report::{DashboardStats, Report, ReportFilter};
use roster::settings::{self, Catalog, Preferences, Profile};
use roster::store::WATCHED_KEYS;
use roster::watch::StorageWatcher;
use roster::{
    query, view, ActivityKind, ChangeBus, Config, Employee, EmployeeDraft, EmployeeId,
    EmployeePatch, EmployeeService, FileStore, RecordStore, ViewControls, ViewPage,
};
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter, Manager, State};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STORAGE_DIR: &str = "EmployeeManager";
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

type Store = Arc<FileStore>;

struct AppState {
    service: Mutex<EmployeeService<Store>>,
    config: Config,
    root: PathBuf,
    /// Set after our own writes so the poller re-primes instead of echoing them.
    wrote: Arc<AtomicBool>,
}

#[derive(Deserialize)]
struct EmployeesViewRequest {
    #[serde(default)]
    controls: ViewControls,
}

#[derive(Deserialize)]
struct EmployeeIdRequest {
    id: String,
}

#[derive(Deserialize)]
struct EditFormRequest {
    query: String,
}

#[derive(Deserialize)]
struct EmployeeCreateRequest {
    employee: EmployeeDraft,
}

#[derive(Deserialize)]
struct EmployeeUpdateRequest {
    id: String,
    patch: EmployeePatch,
}

#[derive(Deserialize)]
struct EmployeeSaveRequest {
    id: Option<String>,
    employee: EmployeeDraft,
}

#[derive(Deserialize)]
struct ChangeRoleRequest {
    id: String,
    role: String,
}

#[derive(Deserialize)]
struct BulkDeleteRequest {
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct DashboardRequest {
    kind: Option<String>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Deserialize)]
struct ReportRequest {
    filter: Option<ReportFilter>,
}

#[derive(Deserialize)]
struct ExportEmployeesRequest {
    #[serde(default)]
    controls: ViewControls,
    filename: Option<String>,
}

#[derive(Deserialize)]
struct ExportReportRequest {
    #[serde(default)]
    filter: ReportFilter,
    filename: Option<String>,
}

#[derive(Deserialize)]
struct CatalogRequest {
    catalog: Catalog,
}

#[derive(Deserialize)]
struct CatalogEntryRequest {
    catalog: Catalog,
    name: String,
}

#[derive(Serialize)]
struct StorageInfoResult {
    ok: bool,
    path_label: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationResult {
    ok: bool,
    employee: Option<Employee>,
    errors: Vec<FieldError>,
    notice: Notice,
}

#[derive(Serialize)]
struct SaveCsvResult {
    ok: bool,
    canceled: bool,
    filename: String,
    path: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct DashboardResult {
    stats: DashboardStats,
    feed: Vec<FeedItem>,
}

fn lock_service(state: &AppState) -> Result<MutexGuard<'_, EmployeeService<Store>>, String> {
    state
        .service
        .lock()
        .map_err(|_| "employee service lock poisoned".to_string())
}

fn parse_id(raw: &str) -> Result<EmployeeId, String> {
    EmployeeId::parse(raw).ok_or_else(|| "Employee id is required".to_string())
}

fn mutation_result(
    state: &AppState,
    outcome: roster::Result<Option<Employee>>,
    success: &str,
) -> MutationResult {
    state.wrote.store(true, Ordering::SeqCst);
    let notice_ms = state.config.notice_ms;
    match outcome {
        Ok(employee) => MutationResult {
            ok: true,
            employee,
            errors: Vec::new(),
            notice: Notice::success(success, notice_ms),
        },
        Err(err) => {
            warn!(error = %err, "employee mutation rejected");
            MutationResult {
                ok: false,
                employee: None,
                errors: err
                    .validation_errors()
                    .map(|errors| errors.iter().cloned().collect())
                    .unwrap_or_default(),
                notice: Notice::from_error(&err, notice_ms),
            }
        }
    }
}

fn save_csv(filename: String, content: &str) -> Result<SaveCsvResult, String> {
    let path = rfd::FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(filename.as_str())
        .save_file();

    let Some(path) = path else {
        return Ok(SaveCsvResult {
            ok: false,
            canceled: true,
            filename,
            path: None,
            error: None,
        });
    };

    if let Err(err) = export::write_csv(path.clone(), content) {
        return Ok(SaveCsvResult {
            ok: false,
            canceled: false,
            filename,
            path: Some(path.to_string_lossy().to_string()),
            error: Some(err.to_string()),
        });
    }
    info!(path = %path.display(), "csv exported");
    Ok(SaveCsvResult {
        ok: true,
        canceled: false,
        filename,
        path: Some(path.to_string_lossy().to_string()),
        error: None,
    })
}

#[tauri::command]
fn app_version(app: AppHandle) -> String {
    app.package_info().version.to_string()
}

#[tauri::command]
fn storage_info(state: State<'_, AppState>) -> StorageInfoResult {
    StorageInfoResult {
        ok: true,
        path_label: state.root.to_string_lossy().to_string(),
    }
}

#[tauri::command]
fn employees_view(
    state: State<'_, AppState>,
    payload: EmployeesViewRequest,
) -> Result<ViewPage, String> {
    let records = lock_service(&state)?
        .employees()
        .map_err(|err| err.to_string())?;
    Ok(view::compute_view(
        &records,
        &payload.controls,
        state.config.page_size,
    ))
}

#[tauri::command]
fn employee_get(
    state: State<'_, AppState>,
    payload: EmployeeIdRequest,
) -> Result<Option<Employee>, String> {
    let id = parse_id(&payload.id)?;
    lock_service(&state)?.find(&id).map_err(|err| err.to_string())
}

#[tauri::command]
fn employee_edit_form(
    state: State<'_, AppState>,
    payload: EditFormRequest,
) -> Result<EmployeeDraft, String> {
    let records = lock_service(&state)?
        .employees()
        .map_err(|err| err.to_string())?;
    Ok(query::edit_form(&payload.query, &records))
}

#[tauri::command]
fn employee_create(
    state: State<'_, AppState>,
    payload: EmployeeCreateRequest,
) -> Result<MutationResult, String> {
    let outcome = lock_service(&state)?.create_employee(&payload.employee).map(Some);
    Ok(mutation_result(&state, outcome, "Employee added successfully!"))
}

#[tauri::command]
fn employee_update(
    state: State<'_, AppState>,
    payload: EmployeeUpdateRequest,
) -> Result<MutationResult, String> {
    let id = parse_id(&payload.id)?;
    let outcome = lock_service(&state)?
        .update_employee(&id, &payload.patch)
        .map(Some);
    Ok(mutation_result(&state, outcome, "Employee updated successfully!"))
}

#[tauri::command]
fn employee_save(
    state: State<'_, AppState>,
    payload: EmployeeSaveRequest,
) -> Result<MutationResult, String> {
    let id = payload.id.as_deref().and_then(EmployeeId::parse);
    let outcome = lock_service(&state)?
        .save_employee(id.as_ref(), &payload.employee)
        .map(Some);
    Ok(mutation_result(&state, outcome, "Employee saved successfully!"))
}

#[tauri::command]
fn employee_change_role(
    state: State<'_, AppState>,
    payload: ChangeRoleRequest,
) -> Result<MutationResult, String> {
    let id = parse_id(&payload.id)?;
    let outcome = lock_service(&state)?
        .change_role(&id, &payload.role)
        .map(Some);
    Ok(mutation_result(&state, outcome, "Role updated successfully!"))
}

#[tauri::command]
fn employee_delete(
    state: State<'_, AppState>,
    payload: EmployeeIdRequest,
) -> Result<MutationResult, String> {
    let id = parse_id(&payload.id)?;
    let outcome = lock_service(&state)?.delete_employee(&id);
    Ok(mutation_result(&state, outcome, "Employee deleted successfully!"))
}

#[tauri::command]
fn employees_bulk_delete(
    state: State<'_, AppState>,
    payload: BulkDeleteRequest,
) -> Result<usize, String> {
    let ids: Vec<EmployeeId> = payload
        .ids
        .iter()
        .filter_map(|raw| EmployeeId::parse(raw))
        .collect();
    let removed = lock_service(&state)?
        .bulk_delete(&ids)
        .map_err(|err| err.to_string())?;
    state.wrote.store(true, Ordering::SeqCst);
    Ok(removed)
}

#[tauri::command]
fn dashboard_get(
    state: State<'_, AppState>,
    payload: DashboardRequest,
) -> Result<DashboardResult, String> {
    let service = lock_service(&state)?;
    let mut dashboard = Dashboard::new();
    dashboard
        .load(service.store())
        .map_err(|err| err.to_string())?;
    dashboard.set_activity_filter(payload.kind.as_deref().and_then(ActivityKind::parse));
    Ok(DashboardResult {
        stats: dashboard.stats(service.clock().today()),
        feed: dashboard.feed(service.clock().now()),
    })
}

#[tauri::command]
fn dashboard_search(
    state: State<'_, AppState>,
    payload: SearchRequest,
) -> Result<Vec<Employee>, String> {
    let service = lock_service(&state)?;
    let mut dashboard = Dashboard::new();
    dashboard
        .load(service.store())
        .map_err(|err| err.to_string())?;
    Ok(dashboard
        .search(&payload.query)
        .into_iter()
        .cloned()
        .collect())
}

#[tauri::command]
fn report_get(state: State<'_, AppState>, payload: ReportRequest) -> Result<Report, String> {
    let service = lock_service(&state)?;
    let store = service.store();
    let filter = match payload.filter {
        Some(filter) => {
            settings::save_report_filter(store, &filter).map_err(|err| err.to_string())?;
            state.wrote.store(true, Ordering::SeqCst);
            filter
        }
        None => settings::load_report_filter(store).map_err(|err| err.to_string())?,
    };
    let records = store.employees().map_err(|err| err.to_string())?;
    Ok(Report::build(
        &records,
        &filter,
        service.clock().today(),
        state.config.hires_window_months,
        state.config.recent_hires,
    ))
}

#[tauri::command]
fn export_employees_csv(
    state: State<'_, AppState>,
    payload: ExportEmployeesRequest,
) -> Result<SaveCsvResult, String> {
    let records = lock_service(&state)?
        .employees()
        .map_err(|err| err.to_string())?;
    let content = export::employees_csv(view::visible_records(&records, &payload.controls));
    let filename = export::export_filename(
        payload.filename.as_deref().unwrap_or(EMPLOYEES_CSV_FILENAME),
        EMPLOYEES_CSV_FILENAME,
    );
    save_csv(filename, &content)
}

#[tauri::command]
fn export_report_csv(
    state: State<'_, AppState>,
    payload: ExportReportRequest,
) -> Result<SaveCsvResult, String> {
    let service = lock_service(&state)?;
    let records = service.employees().map_err(|err| err.to_string())?;
    let rows = payload.filter.apply(&records, service.clock().today());
    drop(service);
    let content = export::report_csv(rows);
    let filename = export::export_filename(
        payload.filename.as_deref().unwrap_or(REPORT_CSV_FILENAME),
        REPORT_CSV_FILENAME,
    );
    save_csv(filename, &content)
}

#[tauri::command]
fn catalog_get(state: State<'_, AppState>, payload: CatalogRequest) -> Result<Vec<String>, String> {
    let service = lock_service(&state)?;
    settings::list(service.store(), payload.catalog).map_err(|err| err.to_string())
}

#[tauri::command]
fn catalog_add(state: State<'_, AppState>, payload: CatalogEntryRequest) -> Result<bool, String> {
    let service = lock_service(&state)?;
    let added = settings::add(service.store(), payload.catalog, &payload.name)
        .map_err(|err| err.to_string())?;
    if added {
        state.wrote.store(true, Ordering::SeqCst);
    }
    Ok(added)
}

#[tauri::command]
fn catalog_remove(
    state: State<'_, AppState>,
    payload: CatalogEntryRequest,
) -> Result<bool, String> {
    let service = lock_service(&state)?;
    let removed = settings::remove(service.store(), payload.catalog, &payload.name)
        .map_err(|err| err.to_string())?;
    if removed {
        state.wrote.store(true, Ordering::SeqCst);
    }
    Ok(removed)
}

#[tauri::command]
fn preferences_get(state: State<'_, AppState>) -> Result<Preferences, String> {
    let service = lock_service(&state)?;
    settings::load_preferences(service.store()).map_err(|err| err.to_string())
}

#[tauri::command]
fn preferences_set(state: State<'_, AppState>, payload: Preferences) -> Result<bool, String> {
    let service = lock_service(&state)?;
    settings::save_preferences(service.store(), &payload).map_err(|err| err.to_string())?;
    Ok(true)
}

#[tauri::command]
fn profile_get(state: State<'_, AppState>) -> Result<Profile, String> {
    let service = lock_service(&state)?;
    settings::load_profile(service.store()).map_err(|err| err.to_string())
}

#[tauri::command]
fn profile_save(state: State<'_, AppState>, payload: Profile) -> Result<Notice, String> {
    let service = lock_service(&state)?;
    let notice_ms = state.config.notice_ms;
    Ok(match settings::save_profile(service.store(), &payload) {
        Ok(()) => Notice::success("Profile updated successfully!", notice_ms),
        Err(err) => Notice::from_error(&err, notice_ms),
    })
}

/// Polls the watched keys and re-emits outside writes as storage events.
fn spawn_storage_poller(kv: Store, bus: Arc<ChangeBus>, wrote: Arc<AtomicBool>) {
    let mut watcher = match StorageWatcher::new(kv, WATCHED_KEYS) {
        Ok(watcher) => watcher,
        Err(err) => {
            warn!(error = %err, "storage watcher disabled");
            return;
        }
    };
    thread::spawn(move || loop {
        thread::sleep(WATCH_INTERVAL);
        let result = if wrote.swap(false, Ordering::SeqCst) {
            watcher.prime().map(|_| 0)
        } else {
            watcher.poll_and_publish(&bus)
        };
        if let Err(err) = result {
            warn!(error = %err, "storage poll failed");
        }
    });
}

fn forward_changes(app: &AppHandle, bus: &ChangeBus) {
    let handle = app.clone();
    bus.subscribe(move |event| {
        if let Err(err) = handle.emit(event.event_name(), event.clone()) {
            warn!(error = %err, event = event.event_name(), "failed to emit change");
        }
    });
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tauri::Builder::default()
        .setup(|app| {
            let root = app.path().app_data_dir()?.join(STORAGE_DIR);
            let config = Config::load_from_dir(&root).normalized();
            let kv: Store = Arc::new(FileStore::open(root.clone())?);
            let bus = Arc::new(ChangeBus::new());
            let service =
                EmployeeService::with_config(RecordStore::new(kv.clone()), bus.clone(), &config);
            let wrote = Arc::new(AtomicBool::new(false));

            forward_changes(app.handle(), &bus);
            spawn_storage_poller(kv, bus, wrote.clone());
            info!(root = %root.display(), "employee storage ready");

            app.manage(AppState {
                service: Mutex::new(service),
                config,
                root,
                wrote,
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            app_version,
            storage_info,
            employees_view,
            employee_get,
            employee_edit_form,
            employee_create,
            employee_update,
            employee_save,
            employee_change_role,
            employee_delete,
            employees_bulk_delete,
            dashboard_get,
            dashboard_search,
            report_get,
            export_employees_csv,
            export_report_csv,
            catalog_get,
            catalog_add,
            catalog_remove,
            preferences_get,
            preferences_set,
            profile_get,
            profile_save
        ])
        .run(tauri::generate_context!())
        .expect("failed to run Employee Manager");
}
