use super::{ApiClient, ClientResult};
use crate::models::{
    AdminDashboard, AttendanceRecord, AttendanceStats, CheckRequest, LoginRequest, LoginResponse,
    Member, MemberDashboard, MemberPage, MemberQuery, MemberStats, MemberUpdate, MembershipType,
    MyInfo, MyInfoUpdate, NewMember, NewMembershipType, NewPayment, NewReservation, NewSchedule,
    PasswordChange, Payment, PaymentPage, PaymentQuery, PaymentStats, PaymentUpdate, PublicUser,
    RefreshRequest, Reservation, ReservationView, Schedule, ScheduleFilter, ScheduleStats,
    ScheduleUpdate, ScheduleView,
};
use chrono::NaiveDate;
use serde_json::json;

impl ApiClient {
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        self.post("/auth/login", request, false).await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.post("/auth/logout", &json!({}), true).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> ClientResult<LoginResponse> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post("/auth/refresh", &request, false).await
    }

    pub async fn verify(&self) -> ClientResult<PublicUser> {
        self.get("/auth/verify", &[]).await
    }

    pub async fn me(&self) -> ClientResult<MyInfo> {
        self.get("/me", &[]).await
    }

    pub async fn update_me(&self, update: &MyInfoUpdate) -> ClientResult<Member> {
        self.put("/me", update).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> ClientResult<()> {
        self.put("/me/password", change).await
    }

    pub async fn withdraw(&self) -> ClientResult<()> {
        self.delete("/me").await
    }

    // members

    pub async fn members(&self, query: &MemberQuery) -> ClientResult<MemberPage> {
        self.get(
            "/members",
            &[
                ("page", query.page.map(|page| page.to_string())),
                ("limit", query.limit.map(|limit| limit.to_string())),
                ("search", query.search.clone()),
                ("status", query.status.clone()),
            ],
        )
        .await
    }

    pub async fn member(&self, id: u64) -> ClientResult<Member> {
        self.get(&format!("/members/{id}"), &[]).await
    }

    pub async fn member_stats(&self) -> ClientResult<MemberStats> {
        self.get("/members/stats", &[]).await
    }

    pub async fn create_member(&self, member: &NewMember) -> ClientResult<Member> {
        self.post("/members", member, true).await
    }

    pub async fn update_member(&self, id: u64, update: &MemberUpdate) -> ClientResult<Member> {
        self.put(&format!("/members/{id}"), update).await
    }

    pub async fn delete_member(&self, id: u64) -> ClientResult<Member> {
        self.delete(&format!("/members/{id}")).await
    }

    pub async fn member_payments(&self, id: u64) -> ClientResult<Vec<Payment>> {
        self.get(&format!("/members/{id}/payments"), &[]).await
    }

    pub async fn member_attendance(&self, id: u64) -> ClientResult<Vec<AttendanceRecord>> {
        self.get(&format!("/members/{id}/attendance"), &[]).await
    }

    pub async fn member_reservations(&self, id: u64) -> ClientResult<Vec<ReservationView>> {
        self.get(&format!("/members/{id}/reservations"), &[]).await
    }

    // payments

    pub async fn payments(&self, query: &PaymentQuery) -> ClientResult<PaymentPage> {
        self.get(
            "/payments",
            &[
                ("search", query.search.clone()),
                ("membershipTypeId", query.membership_type_id.clone()),
                ("month", query.month.clone()),
                ("page", query.page.map(|page| page.to_string())),
                ("limit", query.limit.map(|limit| limit.to_string())),
            ],
        )
        .await
    }

    pub async fn payment(&self, id: u64) -> ClientResult<Payment> {
        self.get(&format!("/payments/{id}"), &[]).await
    }

    pub async fn payment_stats(&self) -> ClientResult<PaymentStats> {
        self.get("/payments/stats", &[]).await
    }

    pub async fn create_payment(&self, payment: &NewPayment) -> ClientResult<Payment> {
        self.post("/payments", payment, true).await
    }

    pub async fn update_payment(&self, id: u64, update: &PaymentUpdate) -> ClientResult<Payment> {
        self.put(&format!("/payments/{id}"), update).await
    }

    pub async fn delete_payment(&self, id: u64) -> ClientResult<Payment> {
        self.delete(&format!("/payments/{id}")).await
    }

    pub async fn membership_types(&self) -> ClientResult<Vec<MembershipType>> {
        self.get("/membership-types", &[]).await
    }

    pub async fn create_membership_type(&self, kind: &NewMembershipType) -> ClientResult<MembershipType> {
        self.post("/membership-types", kind, true).await
    }

    pub async fn update_membership_type(
        &self,
        id: u64,
        kind: &NewMembershipType,
    ) -> ClientResult<MembershipType> {
        self.put(&format!("/membership-types/{id}"), kind).await
    }

    pub async fn delete_membership_type(&self, id: u64) -> ClientResult<MembershipType> {
        self.delete(&format!("/membership-types/{id}")).await
    }

    // attendance

    pub async fn attendance(&self, date: Option<NaiveDate>) -> ClientResult<Vec<AttendanceRecord>> {
        self.get("/attendance", &[("date", date.map(|date| date.to_string()))])
            .await
    }

    pub async fn attendance_today(&self) -> ClientResult<Vec<AttendanceRecord>> {
        self.get("/attendance/today", &[]).await
    }

    pub async fn attendance_stats(&self) -> ClientResult<AttendanceStats> {
        self.get("/attendance/stats", &[]).await
    }

    /// Members check themselves in; admins pass the member id.
    pub async fn check_in(&self, member_id: Option<u64>) -> ClientResult<AttendanceRecord> {
        self.post("/attendance/check-in", &CheckRequest { member_id }, true)
            .await
    }

    pub async fn check_out(&self, member_id: Option<u64>) -> ClientResult<AttendanceRecord> {
        self.post("/attendance/check-out", &CheckRequest { member_id }, true)
            .await
    }

    // schedules and reservations

    pub async fn schedules(&self, filter: &ScheduleFilter) -> ClientResult<Vec<ScheduleView>> {
        self.get(
            "/schedules",
            &[("date", filter.date.clone()), ("type", filter.kind.clone())],
        )
        .await
    }

    pub async fn schedule(&self, id: u64) -> ClientResult<ScheduleView> {
        self.get(&format!("/schedules/{id}"), &[]).await
    }

    pub async fn schedule_stats(&self) -> ClientResult<ScheduleStats> {
        self.get("/schedules/stats", &[]).await
    }

    pub async fn create_schedule(&self, schedule: &NewSchedule) -> ClientResult<Schedule> {
        self.post("/schedules", schedule, true).await
    }

    pub async fn update_schedule(&self, id: u64, update: &ScheduleUpdate) -> ClientResult<Schedule> {
        self.put(&format!("/schedules/{id}"), update).await
    }

    pub async fn delete_schedule(&self, id: u64) -> ClientResult<Schedule> {
        self.delete(&format!("/schedules/{id}")).await
    }

    pub async fn reservations(&self, status: Option<&str>) -> ClientResult<Vec<ReservationView>> {
        self.get(
            "/reservations",
            &[("status", status.map(str::to_string))],
        )
        .await
    }

    pub async fn reservation(&self, id: u64) -> ClientResult<ReservationView> {
        self.get(&format!("/reservations/{id}"), &[]).await
    }

    pub async fn reserve(&self, schedule_id: u64) -> ClientResult<Reservation> {
        self.post("/reservations", &NewReservation { schedule_id }, true)
            .await
    }

    pub async fn approve_reservation(&self, id: u64) -> ClientResult<Reservation> {
        self.post(&format!("/reservations/{id}/approve"), &json!({}), true)
            .await
    }

    pub async fn reject_reservation(&self, id: u64) -> ClientResult<Reservation> {
        self.post(&format!("/reservations/{id}/reject"), &json!({}), true)
            .await
    }

    pub async fn cancel_reservation(&self, id: u64) -> ClientResult<Reservation> {
        self.delete(&format!("/reservations/{id}/cancel")).await
    }

    // dashboards

    pub async fn admin_dashboard(&self) -> ClientResult<AdminDashboard> {
        self.get("/dashboard/admin/stats", &[]).await
    }

    pub async fn member_dashboard(&self) -> ClientResult<MemberDashboard> {
        self.get("/dashboard/member/info", &[]).await
    }
}
