//! Property-based tests for the bracket evaluator and the payroll calculators.
//!
//! Amounts are generated in cents so every case is an exact decimal.

use std::sync::OnceLock;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use payroll_engine::calculation::{
    calculate_income_tax, calculate_nssf, calculate_other_deduction, calculate_shif, evaluate,
    evaluate_slices, process_regular_payroll,
};
use payroll_engine::config::{ConfigLoader, RateQuery, RateStore};
use payroll_engine::models::{Bracket, DeductionKind, Employee, PayPeriod, PayrollInput, RateType};

fn config() -> &'static ConfigLoader {
    static CONFIG: OnceLock<ConfigLoader> = OnceLock::new();
    CONFIG.get_or_init(|| ConfigLoader::load("./config/kenya").expect("Failed to load config"))
}

fn payroll_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
}

fn paye_brackets() -> Vec<Bracket> {
    let query = RateQuery::new(DeductionKind::IncomeTax, "regular", payroll_date());
    config()
        .load_rates(&query)
        .unwrap()
        .expect("income tax table configured")
        .brackets
}

fn money() -> impl Strategy<Value = Decimal> {
    (0i64..200_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn non_positive() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..=0).prop_map(|cents| Decimal::new(cents, 2))
}

// =============================================================================
// Bracket Evaluator Properties
// =============================================================================

proptest! {
    /// evaluate is non-decreasing in the amount
    #[test]
    fn prop_evaluate_monotonic(a in money(), b in money()) {
        let brackets = paye_brackets();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(evaluate(low, &brackets) <= evaluate(high, &brackets));
    }

    /// the taxed slices add up to exactly the amount when brackets start at zero
    #[test]
    fn prop_slices_never_double_count(amount in money()) {
        let taxed: Decimal = evaluate_slices(amount, &paye_brackets())
            .iter()
            .map(|slice| slice.taxable)
            .sum();
        prop_assert_eq!(taxed, amount);
    }

    /// no slice is charged on more than the amount itself
    #[test]
    fn prop_each_slice_within_amount(amount in money()) {
        for slice in evaluate_slices(amount, &paye_brackets()) {
            prop_assert!(slice.taxable >= Decimal::ZERO);
            prop_assert!(slice.taxable <= amount);
        }
    }

    /// non-positive amounts reach no bracket
    #[test]
    fn prop_evaluate_non_positive_is_zero(amount in non_positive()) {
        prop_assert!(evaluate_slices(amount, &paye_brackets()).is_empty());
        prop_assert_eq!(evaluate(amount, &paye_brackets()), Decimal::ZERO);
    }
}

// =============================================================================
// Zero for Non-positive Pay
// =============================================================================

proptest! {
    /// every calculator returns zero for non-positive salary
    #[test]
    fn prop_calculators_zero_for_non_positive(amount in non_positive()) {
        let store = config();
        let date = payroll_date();

        let tax = calculate_income_tax(store, amount, "regular", date, None, 1).unwrap();
        prop_assert_eq!(tax.tax, Decimal::ZERO);

        let nssf = calculate_nssf(store, amount, "regular", date, None, 1).unwrap();
        prop_assert_eq!(nssf.contribution.employee_total(), Decimal::ZERO);
        prop_assert_eq!(nssf.contribution.employer, Decimal::ZERO);

        let shif = calculate_shif(store, amount, "regular", date, None, 1).unwrap();
        prop_assert_eq!(shif.contribution.employee, Decimal::ZERO);
        prop_assert_eq!(shif.contribution.employer, Decimal::ZERO);

        let levy = calculate_other_deduction(
            store,
            amount,
            &DeductionKind::HousingLevy,
            RateType::Deduction,
            "regular",
            date,
            None,
            1,
        )
        .unwrap();
        prop_assert_eq!(levy.contribution.employee, Decimal::ZERO);
    }
}

// =============================================================================
// Calculator Properties
// =============================================================================

proptest! {
    /// SHIF never falls below the minimum once salary is positive
    #[test]
    fn prop_shif_respects_minimum(cents in 1i64..200_000_000) {
        let salary = Decimal::new(cents, 2);
        let result = calculate_shif(config(), salary, "regular", payroll_date(), None, 1).unwrap();
        prop_assert!(result.contribution.employee >= Decimal::new(300, 0));
    }

    /// NSSF is capped at the upper earnings limit
    #[test]
    fn prop_nssf_capped(salary in money()) {
        let result = calculate_nssf(config(), salary, "regular", payroll_date(), None, 1).unwrap();
        prop_assert!(result.contribution.employee_total() <= Decimal::new(4320, 0));
        prop_assert!(result.contribution.tier_one_employee <= Decimal::new(480, 0));
    }

    /// calculators are pure: identical inputs give identical outputs
    #[test]
    fn prop_income_tax_idempotent(amount in money()) {
        let date = payroll_date();
        let first = calculate_income_tax(config(), amount, "regular", date, None, 1).unwrap();
        let second = calculate_income_tax(config(), amount, "regular", date, None, 1).unwrap();
        prop_assert_eq!(first.tax, second.tax);
        prop_assert_eq!(first.audit_step, second.audit_step);
    }
}

// =============================================================================
// Payroll Line Properties
// =============================================================================

proptest! {
    /// taxable pay never exceeds gross, PAYE after relief is never negative,
    /// and net pay is gross less total deductions
    #[test]
    fn prop_line_totals_consistent(gross in money()) {
        let input = PayrollInput::new(
            Employee::new("emp_prop", "Property"),
            gross,
            PayPeriod::month(2025, 3).unwrap(),
        );

        let line = process_regular_payroll(&input, config()).unwrap();
        let totals = &line.totals;

        prop_assert!(totals.taxable_pay <= totals.gross_pay);
        prop_assert!(totals.taxable_pay >= Decimal::ZERO);
        prop_assert!(totals.paye_after_relief >= Decimal::ZERO);
        prop_assert!(totals.paye_after_relief <= totals.paye_before_relief);
        prop_assert_eq!(totals.net_pay, totals.gross_pay - totals.total_deductions);
    }

    /// the same input always produces the same amounts
    #[test]
    fn prop_line_idempotent(gross in money()) {
        let input = PayrollInput::new(
            Employee::new("emp_prop", "Property"),
            gross,
            PayPeriod::month(2025, 3).unwrap(),
        );

        let first = process_regular_payroll(&input, config()).unwrap();
        let second = process_regular_payroll(&input, config()).unwrap();
        prop_assert_eq!(first.totals, second.totals);
        prop_assert_eq!(first.nssf, second.nssf);
    }
}
