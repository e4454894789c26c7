use crate::api::assignment::CreateAssignment;
use crate::api::attendance::{
    CheckInFilter, CheckInListResponse, CheckInRequest, EvaluateGeofence, GeofenceEvaluation,
};
use crate::api::chat::{ConversationQuery, ConversationResponse, SendMessage};
use crate::api::dashboard::{DashboardSummary, StatusCount};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::expense::{
    BudgetUtilization, ClaimFilter, ClaimListResponse, CreateClaim, SetBudget,
};
use crate::api::leave_request::{
    CreateLeave, DecideLeave, LeaveFilter, LeaveListResponse, LeaveResponse, LeaveType,
};
use crate::api::notice::PublishNotice;
use crate::api::payroll::{
    CreatePayroll, PaginatedPayrollResponse, PayrollQuery, PayrollResponse, UpdatePayroll,
};
use crate::api::recruitment::{
    ApplyCandidate, BoardColumn, BoardQuery, CreatePosting, MoveCandidate,
};
use crate::api::site::{CreateSite, SiteListResponse, SiteQuery, UpdateSite};
use crate::model::assignment::{AssignmentStatus, SiteAssignment};
use crate::model::attendance::Attendance;
use crate::model::chat::ChatMessage;
use crate::model::check_in::CheckInRecord;
use crate::model::employee::Employee;
use crate::model::expense::{ExpenseBudget, ExpenseClaim};
use crate::model::notice::{Notice, NoticeAudience};
use crate::model::recruitment::{Candidate, CandidateStatus, JobPosting};
use crate::model::site::Site;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Worksite HRM API",
        version = "1.0.0",
        description = r#"
## Worksite HRM System

This API powers an HR and attendance system for organizations whose employees
work at geofenced field sites.

### 🔹 Key Features
- **Site & Assignment Management**
  - Define sites with a geofence radius, assign each employee to one active site
- **Verified Check-In**
  - Photo plus submit-time location fix, distance-checked against the site radius
- **Leave Management**
  - Apply for leave, approve/reject requests, and view leave history
- **Expense Claims**
  - Submit claims, approve/reject, track monthly budget utilization
- **Payroll Management**
  - Generate payroll stubs, update salaries, and view payroll records
- **Recruitment**
  - Job postings and a candidate pipeline board
- **Notices & Chat**
  - Audience-targeted notices and direct messages, with a live event stream

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Only authorized roles such as **Admin** or **HR** can access sensitive operations.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
- `GET /api/v1/events/stream` is a server-sent-events feed of domain events

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::site::create_site,
        crate::api::site::list_sites,
        crate::api::site::get_site,
        crate::api::site::update_site,

        crate::api::assignment::create_assignment,
        crate::api::assignment::my_assignment,
        crate::api::assignment::employee_assignments,

        crate::api::attendance::evaluate_geofence,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_check_ins,
        crate::api::attendance::my_check_ins,
        crate::api::attendance::list_daily,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::expense::create_claim,
        crate::api::expense::list_claims,
        crate::api::expense::approve_claim,
        crate::api::expense::reject_claim,
        crate::api::expense::set_budget,
        crate::api::expense::budget_utilization,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::my_payrolls,

        crate::api::recruitment::create_posting,
        crate::api::recruitment::list_postings,
        crate::api::recruitment::close_posting,
        crate::api::recruitment::add_candidate,
        crate::api::recruitment::move_candidate,
        crate::api::recruitment::candidate_board,

        crate::api::notice::publish_notice,
        crate::api::notice::list_notices,

        crate::api::chat::send_message,
        crate::api::chat::conversation,

        crate::api::dashboard::summary,

        crate::api::event_stream::event_stream
    ),
    components(
        schemas(
            Site,
            CreateSite,
            UpdateSite,
            SiteQuery,
            SiteListResponse,
            SiteAssignment,
            AssignmentStatus,
            CreateAssignment,
            CheckInRecord,
            Attendance,
            CheckInRequest,
            CheckInFilter,
            CheckInListResponse,
            EvaluateGeofence,
            GeofenceEvaluation,
            LeaveType,
            CreateLeave,
            DecideLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            ExpenseClaim,
            ExpenseBudget,
            CreateClaim,
            SetBudget,
            ClaimFilter,
            ClaimListResponse,
            BudgetUtilization,
            Employee,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            PaginatedPayrollResponse,
            PayrollResponse,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            JobPosting,
            Candidate,
            CandidateStatus,
            CreatePosting,
            ApplyCandidate,
            MoveCandidate,
            BoardQuery,
            BoardColumn,
            Notice,
            NoticeAudience,
            PublishNotice,
            ChatMessage,
            SendMessage,
            ConversationQuery,
            ConversationResponse,
            StatusCount,
            DashboardSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Sites", description = "Site and geofence management APIs"),
        (name = "Assignments", description = "Employee-to-site assignment APIs"),
        (name = "Attendance", description = "Verified check-in and attendance APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Expenses", description = "Expense claim and budget APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Recruitment", description = "Job posting and candidate pipeline APIs"),
        (name = "Notices", description = "Company notice APIs"),
        (name = "Chat", description = "Direct messaging APIs"),
        (name = "Dashboard", description = "Admin dashboard APIs"),
        (name = "Events", description = "Live event stream"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
