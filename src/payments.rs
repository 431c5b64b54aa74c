use crate::errors::{DomainError, DomainResult};
use crate::members::{csv_row, is_expiring, paging};
use crate::models::{
    AppData, MemberStatus, MembershipType, NewMembershipType, NewPayment, Payment, PaymentPage,
    PaymentQuery, PaymentStats, PaymentStatus, PaymentUpdate,
};
use crate::validation::{Errors, rules};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::info;

const TYPE_NOT_FOUND: &str = "회원권 종류를 찾을 수 없습니다.";
const PAYMENT_NOT_FOUND: &str = "결제 내역을 찾을 수 없습니다.";

pub fn list_types(data: &AppData) -> Vec<MembershipType> {
    data.membership_types.clone()
}

fn validate_type(input: &NewMembershipType) -> DomainResult<()> {
    let mut errors = Errors::default();
    errors.check(rules::required(&input.name, "회원권 이름"));
    if input.duration == 0 {
        errors.push("기간은 1일 이상이어야 합니다.");
    }
    errors.into_result()
}

pub fn create_type(data: &mut AppData, input: NewMembershipType) -> DomainResult<MembershipType> {
    validate_type(&input)?;
    let name = input.name.trim().to_string();
    if data.membership_types.iter().any(|kind| kind.name == name) {
        return Err(DomainError::conflict("이미 존재하는 회원권입니다."));
    }
    let kind = MembershipType {
        id: data.sequences.next_membership_type(),
        name,
        duration: input.duration,
        price: input.price,
    };
    data.membership_types.push(kind.clone());
    info!(membership_type_id = kind.id, name = %kind.name, "membership type created");
    Ok(kind)
}

pub fn update_type(data: &mut AppData, id: u64, input: NewMembershipType) -> DomainResult<MembershipType> {
    validate_type(&input)?;
    let kind = data
        .membership_types
        .iter_mut()
        .find(|kind| kind.id == id)
        .ok_or_else(|| DomainError::not_found(TYPE_NOT_FOUND))?;
    kind.name = input.name.trim().to_string();
    kind.duration = input.duration;
    kind.price = input.price;
    info!(membership_type_id = id, "membership type updated");
    Ok(kind.clone())
}

/// Past payments keep their own copy of the type name, so deleting a type
/// does not touch them.
pub fn delete_type(data: &mut AppData, id: u64) -> DomainResult<MembershipType> {
    let index = data
        .membership_types
        .iter()
        .position(|kind| kind.id == id)
        .ok_or_else(|| DomainError::not_found(TYPE_NOT_FOUND))?;
    let kind = data.membership_types.remove(index);
    info!(membership_type_id = id, "membership type deleted");
    Ok(kind)
}

/// Records a payment and extends the member's membership. A membership that
/// is still running is extended from the day after it ends; otherwise the
/// new period starts on the paid date.
pub fn create_payment(data: &mut AppData, input: NewPayment, today: NaiveDate) -> DomainResult<Payment> {
    let kind = data
        .membership_type(input.membership_type_id)
        .cloned()
        .ok_or_else(|| DomainError::not_found(TYPE_NOT_FOUND))?;
    let paid_date = input.paid_date.unwrap_or(today);
    let member = data
        .member_mut(input.member_id)
        .ok_or_else(|| DomainError::not_found("회원을 찾을 수 없습니다."))?;

    let start_date = match member.membership_end {
        Some(end) if member.status == MemberStatus::Active && end >= paid_date => end + Duration::days(1),
        _ => paid_date,
    };
    let end_date = start_date + Duration::days(i64::from(kind.duration));

    member.membership_type = Some(kind.name.clone());
    if member.membership_start.is_none() || start_date == paid_date {
        member.membership_start = Some(start_date);
    }
    member.membership_end = Some(end_date);
    member.status = MemberStatus::Active;
    let member_name = member.name.clone();

    let payment = Payment {
        id: data.sequences.next_payment(),
        member_id: input.member_id,
        member_name,
        membership_type_id: kind.id,
        type_name: kind.name,
        amount: input.amount.unwrap_or(kind.price),
        paid_date,
        start_date,
        end_date,
        status: PaymentStatus::Completed,
    };
    data.payments.push(payment.clone());
    info!(
        payment_id = payment.id,
        member_id = payment.member_id,
        amount = payment.amount,
        "payment recorded"
    );
    Ok(payment)
}

pub fn get_payment(data: &AppData, id: u64) -> DomainResult<Payment> {
    data.payments
        .iter()
        .find(|payment| payment.id == id)
        .cloned()
        .ok_or_else(|| DomainError::not_found(PAYMENT_NOT_FOUND))
}

pub fn update_payment(data: &mut AppData, id: u64, input: PaymentUpdate) -> DomainResult<Payment> {
    let payment = data
        .payments
        .iter_mut()
        .find(|payment| payment.id == id)
        .ok_or_else(|| DomainError::not_found(PAYMENT_NOT_FOUND))?;
    payment.status = input.status;
    info!(payment_id = id, status = input.status.label(), "payment updated");
    Ok(payment.clone())
}

pub fn delete_payment(data: &mut AppData, id: u64) -> DomainResult<Payment> {
    let index = data
        .payments
        .iter()
        .position(|payment| payment.id == id)
        .ok_or_else(|| DomainError::not_found(PAYMENT_NOT_FOUND))?;
    let payment = data.payments.remove(index);
    info!(payment_id = id, "payment deleted");
    Ok(payment)
}

fn parse_month(raw: &str) -> DomainResult<(i32, u32)> {
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .map(|date| (date.year(), date.month()))
        .map_err(|_| DomainError::invalid("월 형식이 올바르지 않습니다. (YYYY-MM)"))
}

fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// Payments newest first, filtered by member name, membership type and
/// `YYYY-MM` month.
pub fn list(data: &AppData, query: &PaymentQuery) -> DomainResult<PaymentPage> {
    let (page, limit) = paging(query.page, query.limit);
    let search = query.search.as_deref().map(str::trim).unwrap_or_default();
    let type_id = match query.membership_type_id.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<u64>()
                .map_err(|_| DomainError::invalid("회원권 종류가 올바르지 않습니다."))?,
        ),
    };
    let month = match query.month.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_month(raw)?),
    };

    let mut filtered: Vec<&Payment> = data
        .payments
        .iter()
        .filter(|p| search.is_empty() || p.member_name.contains(search))
        .filter(|p| type_id.is_none_or(|id| p.membership_type_id == id))
        .filter(|p| month.is_none_or(|(year, month)| in_month(p.paid_date, year, month)))
        .collect();
    filtered.sort_by(|a, b| b.paid_date.cmp(&a.paid_date).then(b.id.cmp(&a.id)));

    Ok(PaymentPage {
        total: filtered.len(),
        payments: filtered
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect(),
        page,
        limit,
    })
}

pub fn member_payments(data: &AppData, member_id: u64) -> Vec<Payment> {
    let mut payments: Vec<Payment> = data
        .payments
        .iter()
        .filter(|p| p.member_id == member_id)
        .cloned()
        .collect();
    payments.sort_by(|a, b| b.paid_date.cmp(&a.paid_date).then(b.id.cmp(&a.id)));
    payments
}

/// Figures for the current month. Refunded payments do not count as revenue.
pub fn stats(data: &AppData, today: NaiveDate) -> PaymentStats {
    let this_month: Vec<&Payment> = data
        .payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed)
        .filter(|p| in_month(p.paid_date, today.year(), today.month()))
        .collect();
    let revenue: u64 = this_month.iter().map(|p| p.amount).sum();
    PaymentStats {
        monthly_revenue: revenue,
        new_payments: this_month.len(),
        expiring_soon: data.members.iter().filter(|m| is_expiring(m, today)).count(),
        average_payment: if this_month.is_empty() {
            0
        } else {
            revenue / this_month.len() as u64
        },
    }
}

pub fn export_csv(data: &AppData) -> String {
    let mut out = csv_row(&[
        "결제번호".into(),
        "회원명".into(),
        "회원권".into(),
        "금액".into(),
        "결제일".into(),
        "시작일".into(),
        "종료일".into(),
        "상태".into(),
    ]);
    let mut payments: Vec<&Payment> = data.payments.iter().collect();
    payments.sort_by(|a, b| b.paid_date.cmp(&a.paid_date).then(b.id.cmp(&a.id)));
    for payment in payments {
        out.push_str(&csv_row(&[
            payment.id.to_string(),
            payment.member_name.clone(),
            payment.type_name.clone(),
            payment.amount.to_string(),
            payment.paid_date.to_string(),
            payment.start_date.to_string(),
            payment.end_date.to_string(),
            payment.status.label().to_string(),
        ]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_data_at;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn seeded() -> AppData {
        seed_data_at(today().and_hms_opt(10, 0, 0).unwrap())
    }

    fn member_id(data: &AppData, name: &str) -> u64 {
        data.members.iter().find(|m| m.name == name).unwrap().id
    }

    #[test]
    fn running_membership_is_extended() {
        let mut data = seeded();
        let kim = member_id(&data, "김회원");
        let end = data.member(kim).unwrap().membership_end.unwrap();
        let payment = create_payment(
            &mut data,
            NewPayment {
                member_id: kim,
                membership_type_id: 1,
                ..NewPayment::default()
            },
            today(),
        )
        .unwrap();
        assert_eq!(payment.start_date, end + Duration::days(1));
        assert_eq!(payment.end_date, payment.start_date + Duration::days(30));
        assert_eq!(payment.amount, 80_000);
        assert_eq!(data.member(kim).unwrap().membership_end, Some(payment.end_date));
    }

    #[test]
    fn lapsed_membership_restarts_on_paid_date() {
        let mut data = seeded();
        let sujin = member_id(&data, "이수진");
        let payment = create_payment(
            &mut data,
            NewPayment {
                member_id: sujin,
                membership_type_id: 2,
                amount: Some(200_000),
                paid_date: None,
            },
            today(),
        )
        .unwrap();
        assert_eq!(payment.start_date, today());
        assert_eq!(payment.amount, 200_000);
        let member = data.member(sujin).unwrap();
        assert_eq!(member.status, MemberStatus::Active);
        assert_eq!(member.membership_type.as_deref(), Some("3개월권"));
        assert_eq!(member.membership_start, Some(today()));
    }

    #[test]
    fn unknown_type_or_member_is_not_found() {
        let mut data = seeded();
        let missing_type = NewPayment { member_id: 1, membership_type_id: 99, ..NewPayment::default() };
        assert!(matches!(
            create_payment(&mut data, missing_type, today()).unwrap_err(),
            DomainError::NotFound(_)
        ));
        let missing_member = NewPayment { member_id: 99, membership_type_id: 1, ..NewPayment::default() };
        assert!(matches!(
            create_payment(&mut data, missing_member, today()).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn list_filters_by_type_and_month() {
        let data = seeded();
        let all = list(&data, &PaymentQuery::default()).unwrap();
        assert_eq!(all.total, 3);
        assert!(all.payments[0].paid_date >= all.payments[1].paid_date);

        let monthly = list(
            &data,
            &PaymentQuery { membership_type_id: Some("1".into()), ..PaymentQuery::default() },
        )
        .unwrap();
        assert_eq!(monthly.total, 2);

        let december = list(
            &data,
            &PaymentQuery { month: Some("2025-12".into()), ..PaymentQuery::default() },
        )
        .unwrap();
        assert!(december.payments.iter().all(|p| p.paid_date.month() == 12));

        assert!(list(&data, &PaymentQuery { month: Some("12-2025".into()), ..PaymentQuery::default() }).is_err());
    }

    #[test]
    fn refunds_leave_revenue() {
        let mut data = seeded();
        let minji = member_id(&data, "김민지");
        let payment = create_payment(
            &mut data,
            NewPayment { member_id: minji, membership_type_id: 1, ..NewPayment::default() },
            today(),
        )
        .unwrap();
        assert_eq!(stats(&data, today()).monthly_revenue, 80_000);

        update_payment(&mut data, payment.id, PaymentUpdate { status: PaymentStatus::Refunded }).unwrap();
        let after = stats(&data, today());
        assert_eq!(after.monthly_revenue, 0);
        assert_eq!(after.average_payment, 0);
    }

    #[test]
    fn type_validation() {
        let mut data = seeded();
        let err = create_type(&mut data, NewMembershipType { name: " ".into(), duration: 0, price: 0 }).unwrap_err();
        match err {
            DomainError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        assert!(create_type(&mut data, NewMembershipType { name: "1개월권".into(), duration: 30, price: 1 }).is_err());
        let kind = create_type(&mut data, NewMembershipType { name: "2주권".into(), duration: 14, price: 45_000 }).unwrap();
        assert_eq!(kind.id, 5);
        delete_type(&mut data, kind.id).unwrap();
        assert_eq!(list_types(&data).len(), 4);
    }

    #[test]
    fn export_has_header_and_rows() {
        let data = seeded();
        let csv = export_csv(&data);
        assert!(csv.starts_with("결제번호,회원명"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn huge_page_number_is_an_empty_page() {
        let data = seeded();
        let page = list(
            &data,
            &PaymentQuery {
                page: Some(usize::MAX),
                ..PaymentQuery::default()
            },
        )
        .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.payments.is_empty());
    }
}
