//! Property tests for the list view: filtering, stable sorting and paging.

use std::cmp::Ordering;

use chrono::NaiveDate;
use proptest::prelude::*;

use roster::view::{compute_view, sort_records, total_pages, visible_records, ALL_ROLES};
use roster::{Employee, EmployeeId, SortColumn, SortState, Status, ViewControls};

const NAMES: [&str; 6] = ["Asha", "Bala", "Chitra", "Dev", "Esha", "Farid"];
const ROLES: [&str; 4] = ["Developer", "Designer", "HR", "Manager"];

fn arb_employee(index: usize) -> impl Strategy<Value = Employee> {
    (
        0..NAMES.len(),
        0..ROLES.len(),
        prop::option::of(0i64..90),
        prop::option::of(0u32..8),
        any::<bool>(),
    )
        .prop_map(move |(name, role, day, salary, active)| Employee {
            id: EmployeeId::Number(index as i64 + 1),
            name: NAMES[name].to_string(),
            email: format!("{}{index}@corp.example", NAMES[name].to_lowercase()),
            phone: None,
            role: ROLES[role].to_string(),
            department: "Engineering".to_string(),
            start_date: day.and_then(|day| {
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .and_then(|base| base.checked_add_signed(chrono::Duration::days(day)))
            }),
            salary: salary.map(|step| f64::from(step) * 12_500.0),
            status: if active { Status::Active } else { Status::Inactive },
            created_at: None,
            updated_at: None,
        })
}

fn arb_records() -> impl Strategy<Value = Vec<Employee>> {
    (0usize..24).prop_flat_map(|len| (0..len).map(arb_employee).collect::<Vec<_>>())
}

fn arb_column() -> impl Strategy<Value = SortColumn> {
    prop_oneof![
        Just(SortColumn::Id),
        Just(SortColumn::Name),
        Just(SortColumn::Email),
        Just(SortColumn::Role),
        Just(SortColumn::StartDate),
        Just(SortColumn::Salary),
        Just(SortColumn::Status),
    ]
}

fn arb_controls() -> impl Strategy<Value = ViewControls> {
    (
        prop_oneof![Just(""), Just("a"), Just("DEV"), Just("sha"), Just("zzz")],
        prop_oneof![Just(ALL_ROLES), Just("Developer"), Just("HR")],
        prop::option::of(arb_column()),
        any::<bool>(),
    )
        .prop_map(|(search, role, column, ascending)| ViewControls {
            search: search.to_string(),
            role: role.to_string(),
            sort: SortState { column, ascending },
            page: 1,
        })
}

fn ids(rows: &[&Employee]) -> Vec<EmployeeId> {
    rows.iter().map(|employee| employee.id.clone()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn pages_concatenate_to_visible_rows(
        records in arb_records(),
        controls in arb_controls(),
        page_size in 1usize..7,
    ) {
        let expected: Vec<EmployeeId> = ids(&visible_records(&records, &controls));
        let pages = total_pages(expected.len(), page_size);

        let mut seen = Vec::new();
        for page in 1..=pages.max(1) {
            let view = compute_view(&records, &ViewControls { page, ..controls.clone() }, page_size);
            prop_assert_eq!(view.total_filtered, expected.len());
            prop_assert_eq!(view.total_pages, pages);
            prop_assert!(view.rows.len() <= page_size);
            seen.extend(view.rows.into_iter().map(|employee| employee.id));
        }
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn filtered_rows_match_search_and_role(
        records in arb_records(),
        controls in arb_controls(),
    ) {
        let needle = controls.search.to_lowercase();
        for employee in visible_records(&records, &controls) {
            let text = format!("{} {} {}", employee.name, employee.email, employee.role).to_lowercase();
            prop_assert!(text.contains(&needle));
            prop_assert!(controls.role == ALL_ROLES || employee.role == controls.role);
        }
    }

    #[test]
    fn sorting_twice_changes_nothing(
        records in arb_records(),
        column in arb_column(),
        ascending in any::<bool>(),
    ) {
        let sort = SortState::by(column, ascending);
        let mut once: Vec<&Employee> = records.iter().collect();
        sort_records(&mut once, sort);
        let mut twice = once.clone();
        sort_records(&mut twice, sort);
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn descending_mirrors_ascending_keys(records in arb_records(), column in arb_column()) {
        let mut up: Vec<&Employee> = records.iter().collect();
        sort_records(&mut up, SortState::by(column, true));
        let mut down: Vec<&Employee> = records.iter().collect();
        sort_records(&mut down, SortState::by(column, false));

        let n = up.len();
        for i in 0..n {
            prop_assert_eq!(column.compare(down[i], up[n - 1 - i]), Ordering::Equal);
        }
    }

    #[test]
    fn ties_keep_input_order(records in arb_records(), column in arb_column(), ascending in any::<bool>()) {
        let mut rows: Vec<&Employee> = records.iter().collect();
        sort_records(&mut rows, SortState::by(column, ascending));
        for pair in rows.windows(2) {
            if column.compare(pair[0], pair[1]) == Ordering::Equal {
                // ids follow input order in the generated records
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[test]
    fn page_is_clamped_into_range(records in arb_records(), page in 0usize..40) {
        let controls = ViewControls { page, ..ViewControls::default() };
        let view = compute_view(&records, &controls, 5);
        prop_assert!(view.page >= 1);
        prop_assert!(view.page <= view.total_pages.max(1));
        prop_assert_eq!(view.pages.iter().filter(|button| button.active).count(), view.total_pages.min(1));
    }
}
