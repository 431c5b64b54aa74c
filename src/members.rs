use crate::auth::revoke_user_sessions;
use crate::config::{DEFAULT_LIMIT, DEFAULT_PAGE, EXPIRING_WINDOW_DAYS, MAX_LIMIT};
use crate::errors::{DomainError, DomainResult};
use crate::models::{
    AppData, Member, MemberPage, MemberQuery, MemberStats, MemberStatus, MemberUpdate,
    MyInfoUpdate, NewMember,
};
use crate::schedule::release_member_reservations;
use crate::validation::{Errors, format_phone, phone_digits, rules};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::info;

/// Clamps paging input to `(page, limit)`.
pub fn paging(page: Option<usize>, limit: Option<usize>) -> (usize, usize) {
    let page = page.filter(|page| *page > 0).unwrap_or(DEFAULT_PAGE);
    let limit = limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    (page, limit)
}

pub fn total_pages(total: usize, limit: usize) -> usize {
    total.div_ceil(limit.max(1))
}

fn matches_search(member: &Member, search: &str) -> bool {
    if member.name.contains(search) {
        return true;
    }
    let digits = phone_digits(search);
    !digits.is_empty() && phone_digits(&member.phone).contains(&digits)
}

pub fn list(data: &AppData, query: &MemberQuery) -> MemberPage {
    let (page, limit) = paging(query.page, query.limit);
    let search = query.search.as_deref().map(str::trim).unwrap_or_default();
    let status = query.status.as_deref().and_then(MemberStatus::parse);

    let filtered: Vec<&Member> = data
        .members
        .iter()
        .filter(|member| status.is_none_or(|status| member.status == status))
        .filter(|member| search.is_empty() || matches_search(member, search))
        .collect();

    MemberPage {
        total: filtered.len(),
        members: filtered
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect(),
        page,
        limit,
    }
}

pub fn get(data: &AppData, id: u64) -> DomainResult<Member> {
    data.member(id)
        .cloned()
        .ok_or_else(|| DomainError::not_found("회원을 찾을 수 없습니다."))
}

fn validate_contact(errors: &mut Errors, phone: Option<&str>, email: Option<&str>) {
    if let Some(phone) = phone {
        errors.check(rules::phone(phone));
    }
    if let Some(email) = email {
        errors.check(rules::email(email));
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn create(data: &mut AppData, input: NewMember, today: NaiveDate) -> DomainResult<Member> {
    let mut errors = Errors::default();
    errors
        .check(rules::required(&input.name, "이름"))
        .check(rules::required(&input.phone, "연락처"));
    validate_contact(&mut errors, Some(input.phone.trim()), input.email.as_deref().map(str::trim));
    errors.into_result()?;

    let id = data.sequences.next_member();
    let member = Member {
        id,
        name: input.name.trim().to_string(),
        phone: format_phone(input.phone.trim()),
        email: blank_to_none(input.email),
        birth_date: input.birth_date,
        gender: blank_to_none(input.gender),
        address: blank_to_none(input.address),
        membership_type: None,
        join_date: today,
        membership_start: None,
        membership_end: None,
        status: MemberStatus::Active,
    };
    data.members.push(member.clone());
    info!(member_id = id, "member registered");
    Ok(member)
}

pub fn update(data: &mut AppData, id: u64, input: MemberUpdate) -> DomainResult<Member> {
    let mut errors = Errors::default();
    if let Some(name) = &input.name {
        errors.check(rules::required(name, "이름"));
    }
    validate_contact(&mut errors, input.phone.as_deref(), input.email.as_deref());
    errors.into_result()?;

    let member = data
        .member_mut(id)
        .ok_or_else(|| DomainError::not_found("회원을 찾을 수 없습니다."))?;
    if let Some(name) = input.name {
        member.name = name.trim().to_string();
    }
    if let Some(phone) = input.phone {
        member.phone = format_phone(phone.trim());
    }
    if input.email.is_some() {
        member.email = blank_to_none(input.email);
    }
    if input.birth_date.is_some() {
        member.birth_date = input.birth_date;
    }
    if input.gender.is_some() {
        member.gender = blank_to_none(input.gender);
    }
    if input.address.is_some() {
        member.address = blank_to_none(input.address);
    }
    if let Some(status) = input.status {
        member.status = status;
    }
    let updated = member.clone();
    sync_member_name(data, &updated);
    info!(member_id = id, "member updated");
    Ok(updated)
}

/// Keeps the denormalised member name on payments and reservations current.
fn sync_member_name(data: &mut AppData, member: &Member) {
    for payment in data.payments.iter_mut().filter(|p| p.member_id == member.id) {
        payment.member_name = member.name.clone();
    }
    for reservation in data.reservations.iter_mut().filter(|r| r.member_id == member.id) {
        reservation.member_name = member.name.clone();
    }
    for record in data.attendance.iter_mut().filter(|r| r.member_id == member.id) {
        record.member_name = member.name.clone();
    }
}

/// Removes a member together with its login. Seats held by the member's
/// reservations are released; payment and attendance history is kept.
pub fn delete(data: &mut AppData, id: u64, now: NaiveDateTime) -> DomainResult<Member> {
    let index = data
        .members
        .iter()
        .position(|member| member.id == id)
        .ok_or_else(|| DomainError::not_found("회원을 찾을 수 없습니다."))?;
    release_member_reservations(data, id, now);
    let member = data.members.remove(index);

    let user_ids: Vec<u64> = data
        .users
        .iter()
        .filter(|user| user.member_id == Some(id))
        .map(|user| user.id)
        .collect();
    for user_id in user_ids {
        revoke_user_sessions(data, user_id);
    }
    data.users.retain(|user| user.member_id != Some(id));
    info!(member_id = id, "member deleted");
    Ok(member)
}

/// Marks active members whose membership ended before `today` as expired.
pub fn refresh_statuses(data: &mut AppData, today: NaiveDate) -> usize {
    let mut changed = 0;
    for member in data.members.iter_mut() {
        let lapsed = member.membership_end.is_some_and(|end| end < today);
        if member.status == MemberStatus::Active && lapsed {
            member.status = MemberStatus::Expired;
            changed += 1;
        }
    }
    if changed > 0 {
        info!(changed, "memberships expired");
    }
    changed
}

pub fn is_expiring(member: &Member, today: NaiveDate) -> bool {
    member.status_on(today) == MemberStatus::Active
        && member
            .membership_end
            .is_some_and(|end| end >= today && end <= today + Duration::days(EXPIRING_WINDOW_DAYS))
}

pub fn stats(data: &AppData, today: NaiveDate) -> MemberStats {
    let count = |status: MemberStatus| {
        data.members
            .iter()
            .filter(|m| m.status_on(today) == status)
            .count()
    };
    MemberStats {
        total: data.members.len(),
        active: count(MemberStatus::Active),
        inactive: count(MemberStatus::Inactive),
        expired: count(MemberStatus::Expired),
        new_this_month: data
            .members
            .iter()
            .filter(|m| m.join_date.year() == today.year() && m.join_date.month() == today.month())
            .count(),
        expiring_soon: data.members.iter().filter(|m| is_expiring(m, today)).count(),
    }
}

/// Self-service edit of the logged-in member's own profile.
pub fn update_my_info(data: &mut AppData, member_id: u64, input: MyInfoUpdate) -> DomainResult<Member> {
    let name = input.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(DomainError::invalid("이름을 입력해주세요."));
    }
    let mut errors = Errors::default();
    if let Some(email) = input.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !crate::validation::is_valid_email(email.trim()) {
            errors.push("유효한 이메일을 입력해주세요.");
        }
    }
    if let Some(phone) = input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        if !crate::validation::is_valid_phone(phone) {
            errors.push("유효한 전화번호를 입력해주세요.");
        }
    }
    errors.into_result()?;

    let member = update(
        data,
        member_id,
        MemberUpdate {
            name: Some(name),
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            email: input.email,
            address: input.address,
            ..MemberUpdate::default()
        },
    )?;
    for user in data.users.iter_mut().filter(|u| u.member_id == Some(member_id)) {
        user.name = member.name.clone();
        user.email = member.email.clone();
    }
    Ok(member)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn csv_row(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn export_csv(data: &AppData) -> String {
    let mut out = csv_row(&[
        "회원번호".into(),
        "이름".into(),
        "연락처".into(),
        "회원권".into(),
        "등록일".into(),
        "만료일".into(),
        "상태".into(),
    ]);
    for member in &data.members {
        out.push_str(&csv_row(&[
            member.code(),
            member.name.clone(),
            member.phone.clone(),
            member.membership_type.clone().unwrap_or_default(),
            member.join_date.to_string(),
            member.membership_end.map(|d| d.to_string()).unwrap_or_default(),
            member.status.label().to_string(),
        ]));
    }
    out
}
