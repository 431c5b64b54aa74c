use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "admin" => Some(Role::Admin),
            "member" => Some(Role::Member),
            _ => None,
        }
    }

    /// Landing page for each login mode.
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Member => "/member",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub email: Option<String>,
    pub member_id: Option<u64>,
}

/// A user as exposed over the API; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub email: Option<String>,
    pub member_id: Option<u64>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
            email: user.email.clone(),
            member_id: user.member_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub refresh_token: String,
    pub user_id: u64,
    pub remember_me: bool,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
    Expired,
}

impl MemberStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "active" => Some(MemberStatus::Active),
            "inactive" => Some(MemberStatus::Inactive),
            "expired" => Some(MemberStatus::Expired),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Expired => "expired",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MemberStatus::Active => "활성",
            MemberStatus::Inactive => "비활성",
            MemberStatus::Expired => "만료",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub membership_type: Option<String>,
    pub join_date: NaiveDate,
    pub membership_start: Option<NaiveDate>,
    pub membership_end: Option<NaiveDate>,
    pub status: MemberStatus,
}

impl Member {
    /// Display code shown in tables, e.g. `M007`.
    pub fn code(&self) -> String {
        format!("M{:03}", self.id)
    }

    /// Status as of `today`: an active membership past its end date is expired.
    pub fn status_on(&self, today: NaiveDate) -> MemberStatus {
        match self.membership_end {
            Some(end) if self.status == MemberStatus::Active && end < today => MemberStatus::Expired,
            _ => self.status,
        }
    }

    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        match self.membership_end {
            Some(end) if end >= today => (end - today).num_days(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipType {
    pub id: u64,
    pub name: String,
    /// Length of the membership in days.
    pub duration: u32,
    pub price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Completed => "완료",
            PaymentStatus::Refunded => "환불",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: u64,
    pub member_id: u64,
    pub member_name: String,
    pub membership_type_id: u64,
    #[serde(rename = "type")]
    pub type_name: String,
    pub amount: u64,
    pub paid_date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: u64,
    pub member_id: u64,
    pub member_name: String,
    pub date: NaiveDate,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
    /// Minutes between check-in and check-out, set on check-out.
    pub duration: Option<i64>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleType {
    #[serde(rename = "PT")]
    Pt,
    #[serde(rename = "강습")]
    Class,
}

impl ScheduleType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "PT" | "pt" => Some(ScheduleType::Pt),
            "강습" | "class" => Some(ScheduleType::Class),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScheduleType::Pt => "PT",
            ScheduleType::Class => "강습",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: u64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ScheduleType,
    pub instructor: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,
    pub booked: u32,
}

impl Schedule {
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.booked)
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// `09:00-10:00`
    pub fn time_range(&self) -> String {
        format!(
            "{}-{}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ReservationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(ReservationStatus::Pending),
            "approved" => Some(ReservationStatus::Approved),
            "rejected" => Some(ReservationStatus::Rejected),
            "cancelled" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "대기중",
            ReservationStatus::Approved => "승인",
            ReservationStatus::Rejected => "거절",
            ReservationStatus::Cancelled => "취소",
        }
    }

    /// Pending and approved reservations hold a seat.
    pub fn is_active(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Approved)
    }

    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: u64,
    pub schedule_id: u64,
    pub member_id: u64,
    pub member_name: String,
    pub status: ReservationStatus,
    pub reserved_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Sequences {
    pub user: u64,
    pub member: u64,
    pub membership_type: u64,
    pub payment: u64,
    pub attendance: u64,
    pub schedule: u64,
    pub reservation: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl Sequences {
    pub fn next_user(&mut self) -> u64 {
        bump(&mut self.user)
    }

    pub fn next_member(&mut self) -> u64 {
        bump(&mut self.member)
    }

    pub fn next_membership_type(&mut self) -> u64 {
        bump(&mut self.membership_type)
    }

    pub fn next_payment(&mut self) -> u64 {
        bump(&mut self.payment)
    }

    pub fn next_attendance(&mut self) -> u64 {
        bump(&mut self.attendance)
    }

    pub fn next_schedule(&mut self) -> u64 {
        bump(&mut self.schedule)
    }

    pub fn next_reservation(&mut self) -> u64 {
        bump(&mut self.reservation)
    }
}

/// Everything the service persists, written as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub users: Vec<User>,
    pub members: Vec<Member>,
    pub membership_types: Vec<MembershipType>,
    pub payments: Vec<Payment>,
    pub attendance: Vec<AttendanceRecord>,
    pub schedules: Vec<Schedule>,
    pub reservations: Vec<Reservation>,
    pub sessions: BTreeMap<String, Session>,
    pub sequences: Sequences,
}

impl AppData {
    pub fn member(&self, id: u64) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn member_mut(&mut self, id: u64) -> Option<&mut Member> {
        self.members.iter_mut().find(|member| member.id == id)
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn schedule(&self, id: u64) -> Option<&Schedule> {
        self.schedules.iter().find(|schedule| schedule.id == id)
    }

    pub fn membership_type(&self, id: u64) -> Option<&MembershipType> {
        self.membership_types.iter().find(|kind| kind.id == id)
    }
}

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub mode: Option<Role>,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    pub members: Vec<Member>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub expired: usize,
    pub new_this_month: usize,
    pub expiring_soon: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMembershipType {
    pub name: String,
    pub duration: u32,
    pub price: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub member_id: u64,
    pub membership_type_id: u64,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub search: Option<String>,
    /// Membership type id, or `all`.
    pub membership_type_id: Option<String>,
    /// `YYYY-MM`
    pub month: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    pub payments: Vec<Payment>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub monthly_revenue: u64,
    pub new_payments: usize,
    pub expiring_soon: usize,
    pub average_payment: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(default)]
    pub member_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAttendance {
    pub total_days: u32,
    pub attended_days: u32,
    pub attendance_rate: u32,
    pub consecutive_days: u32,
    pub total_workout_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub today_count: usize,
    pub weekly_average: f64,
    pub monthly_total: usize,
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFilter {
    /// `YYYY-MM-DD`; empty means every date.
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ScheduleType,
    #[serde(default)]
    pub instructor: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ScheduleType>,
    pub instructor: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub capacity: Option<u32>,
}

/// A schedule as listed to members, with the derived seat count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub available: u32,
}

impl From<&Schedule> for ScheduleView {
    fn from(schedule: &Schedule) -> Self {
        Self {
            available: schedule.available(),
            schedule: schedule.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub schedule_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationQuery {
    pub status: Option<String>,
}

/// A reservation joined with the schedule it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<ScheduleType>,
    pub instructor: String,
    pub date: Option<NaiveDate>,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    pub today_schedules: usize,
    pub weekly_reservations: usize,
    pub pending_reservations: usize,
    pub booking_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub members: MemberStats,
    pub payments: PaymentStats,
    pub attendance: AttendanceStats,
    pub schedule: ScheduleStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDashboard {
    pub member: Member,
    pub remaining_days: i64,
    pub attendance: MonthlyAttendance,
    pub upcoming: Vec<ReservationView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyInfoUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// `GET /api/me`: the login plus, for members, their member record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyInfo {
    pub user: PublicUser,
    pub member: Option<Member>,
}
