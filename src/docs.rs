use crate::api::area::{CreateArea, CreateAreaTask};
use crate::api::assist::{AssistListResponse, CreateAssist, ResolveAssist};
use crate::api::attendance::ClockIn;
use crate::api::cleaner::{CreateCleaner, RosterAssignment};
use crate::api::customer::CreateCustomer;
use crate::api::analytics::SummaryResponse;
use crate::api::review::CreateFeedback;
use crate::api::task_log::{SubmitPhoto, SubmitSelection};
use crate::model::area::{Area, AreaTask};
use crate::model::assist::{AssistEvent, AssistRequest, AssistStatus};
use crate::model::attendance::Attendance;
use crate::model::cleaner::Cleaner;
use crate::model::customer::Customer;
use crate::model::task_log::{PhotoFeedback, TaskPhoto, TaskSelection};
use crate::utils::grouping::{AreaGroup, ReviewPhoto, TaskGroup};
use crate::utils::metrics::{CleanerOnTime, DayCompliance, DayHours, PhotoCompliance};
use crate::utils::snapshot_cache::DailySnapshot;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CleanOps API",
        version = "1.0.0",
        description = r#"
## Cleaning Operations Management

This API powers a cleaning-operations system: cleaners scan area QR codes to
log task activity, managers review attendance, photo evidence and bathroom
assist requests, and administrators manage customers, areas and tasks.

### Key Features
- **Customer / Area / Task administration**
  - CRUD with soft-deleted customers and retired QR codes
- **Attendance**
  - Clock-in / clock-out tracking per customer site
- **Task activity**
  - QR-validated task selections and photo evidence
- **Analytics**
  - Compliance trend, on-time rates, photo compliance, daily snapshots
- **Assist requests**
  - pending → accepted → resolved lifecycle with automatic escalation

### Security
Endpoints are protected using **JWT Bearer authentication** with
admin / manager / cleaner roles.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::customer::create_customer,
        crate::api::customer::list_customers,
        crate::api::customer::get_customer,
        crate::api::customer::update_customer,
        crate::api::customer::delete_customer,

        crate::api::area::create_area,
        crate::api::area::list_areas,
        crate::api::area::update_area,
        crate::api::area::delete_area,
        crate::api::area::create_area_task,
        crate::api::area::list_area_tasks,
        crate::api::area::update_area_task,
        crate::api::area::delete_area_task,

        crate::api::cleaner::create_cleaner,
        crate::api::cleaner::list_cleaners,
        crate::api::cleaner::get_roster,
        crate::api::cleaner::add_to_roster,
        crate::api::cleaner::update_cleaner,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::list_attendance,

        crate::api::task_log::submit_selection,
        crate::api::task_log::submit_photo,
        crate::api::task_log::my_selections,

        crate::api::analytics::summary,
        crate::api::analytics::snapshot,

        crate::api::review::review_photos,
        crate::api::review::create_feedback,
        crate::api::review::list_feedback,

        crate::api::assist::create_assist,
        crate::api::assist::list_assist,
        crate::api::assist::get_assist,
        crate::api::assist::list_assist_events,
        crate::api::assist::accept_assist,
        crate::api::assist::resolve_assist,
        crate::api::assist::cancel_assist,
    ),
    components(
        schemas(
            Customer,
            CreateCustomer,
            Area,
            AreaTask,
            CreateArea,
            CreateAreaTask,
            Cleaner,
            CreateCleaner,
            RosterAssignment,
            Attendance,
            ClockIn,
            TaskSelection,
            TaskPhoto,
            PhotoFeedback,
            SubmitSelection,
            SubmitPhoto,
            CreateFeedback,
            SummaryResponse,
            DayCompliance,
            DayHours,
            CleanerOnTime,
            PhotoCompliance,
            DailySnapshot,
            AreaGroup,
            TaskGroup,
            ReviewPhoto,
            AssistStatus,
            AssistRequest,
            AssistEvent,
            AssistListResponse,
            CreateAssist,
            ResolveAssist
        )
    ),
    tags(
        (name = "Customer", description = "Customer administration APIs"),
        (name = "Area", description = "Area and task administration APIs"),
        (name = "Cleaner", description = "Cleaner and roster APIs"),
        (name = "Attendance", description = "Clock-in / clock-out APIs"),
        (name = "Logs", description = "Task selection and photo logging APIs"),
        (name = "Analytics", description = "Aggregated metrics APIs"),
        (name = "Review", description = "Photo review and feedback APIs"),
        (name = "Assist", description = "Bathroom assist request APIs"),
    )
)]
pub struct ApiDoc;
