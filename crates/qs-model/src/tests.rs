//! Model tests: bank shifts and balking, post-office windows, the charging
//! car, configuration, and report arithmetic.

use std::cell::RefCell;
use std::rc::Rc;

use qs_agenda::Agenda;
use qs_core::{CustomerId, FixedVariates, SimConfig, SimTime, StaffId, WindowId};
use qs_kernel::Simulation;

use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn t(v: f64) -> SimTime {
    SimTime(v)
}

fn agenda(pairs: &[(f64, f64)]) -> Agenda {
    Agenda::from_pairs(pairs).unwrap()
}

fn bank_config(duration: f64, agendas: Vec<Agenda>, arrivals: &[f64]) -> BankConfig {
    BankConfig {
        sim:               SimConfig { start_time: 0.0, duration, seed: 1 },
        mean_interarrival: 1.0,
        mean_patience:     f64::INFINITY,
        mean_service:      1.0,
        arrival_times:     Some(arrivals.to_vec()),
        agendas,
    }
}

/// A bank opened on a fresh simulation, driven by `FixedVariates`.
fn open_bank(config: BankConfig) -> (Simulation, Rc<Bank>) {
    let simulation = Simulation::from_config(&config.sim);
    let bank = BankBuilder::new(config)
        .variates(FixedVariates)
        .observer(NoopObserver)
        .build(&simulation.handle())
        .unwrap();
    bank.open();
    (simulation, bank)
}

fn ids(range: std::ops::RangeInclusive<u32>) -> Vec<CustomerId> {
    range.map(CustomerId).collect()
}

/// Records window and staff milestones.
#[derive(Default)]
struct Recorder {
    opened:   Vec<(SimTime, WindowId)>,
    closed:   Vec<(SimTime, WindowId)>,
    on_duty:  Vec<(SimTime, StaffId)>,
    off_duty: Vec<(SimTime, StaffId)>,
    balks:    Vec<(SimTime, CustomerId)>,
}

impl ModelObserver for Recorder {
    fn on_window_open(&mut self, time: SimTime, window: WindowId) {
        self.opened.push((time, window));
    }

    fn on_window_closed(&mut self, time: SimTime, window: WindowId) {
        self.closed.push((time, window));
    }

    fn on_staff_on_duty(&mut self, time: SimTime, staff: StaffId) {
        self.on_duty.push((time, staff));
    }

    fn on_staff_off_duty(&mut self, time: SimTime, staff: StaffId) {
        self.off_duty.push((time, staff));
    }

    fn on_balk(&mut self, time: SimTime, customer: CustomerId) {
        self.balks.push((time, customer));
    }
}

// ── Bank ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod bank {
    use super::*;

    #[test]
    fn single_shift_serves_until_its_end() {
        let arrivals: Vec<f64> = (0..=20).map(f64::from).collect();
        let config = bank_config(20.0, vec![agenda(&[(0.0, 10.0)])], &arrivals);
        let (mut simulation, bank) = open_bank(config);
        simulation.run_until(20.0).unwrap();

        let report = bank.report();
        assert_eq!(report.total, 21);
        assert_eq!(report.satisfied, 10);
        assert_eq!(report.unsatisfied, 11);
        assert_eq!(report.still_waiting, 11);
        assert_eq!(report.served_by[0].customers, ids(1..=10));
        assert_eq!(report.average_total_time, 1.0);
        assert!((report.average_waiting_time - 55.0 / 21.0).abs() < 1e-12);
        assert_eq!(bank.staff()[0].status(), StaffStatus::OffDuty);
    }

    #[test]
    fn impatient_customer_balks() {
        let mut config = bank_config(5.0, vec![agenda(&[(0.0, 10.0)])], &[0.0, 0.0]);
        config.mean_service = 2.0;
        config.mean_patience = 1.0;
        let (mut simulation, bank) = open_bank(config);
        simulation.run_until(5.0).unwrap();

        let customers = bank.customers();
        assert_eq!(customers[0].state, CustomerState::Satisfied);
        assert_eq!(customers[1].state, CustomerState::Balked);
        assert_eq!(customers[1].waiting_time, 1.0);

        // The staff member is back in the pool, exactly once.
        assert_eq!(bank.available().len(), 1);
        assert_eq!(bank.staff()[0].status(), StaffStatus::Available);
    }

    #[test]
    fn idle_staff_leave_the_pool_at_shift_end() {
        let config = bank_config(10.0, vec![agenda(&[(0.0, 2.0), (5.0, 7.0)])], &[3.0]);
        let (mut simulation, bank) = open_bank(config);

        simulation.run_until(4.0).unwrap();
        assert!(bank.available().is_empty());
        assert_eq!(bank.staff()[0].status(), StaffStatus::OffDuty);
        assert_eq!(bank.customers()[0].state, CustomerState::Waiting);

        simulation.run_until(10.0).unwrap();
        let customer = &bank.customers()[0];
        assert_eq!(customer.state, CustomerState::Satisfied);
        assert_eq!(customer.waiting_time, 2.0);
        assert_eq!(customer.served_by, Some(StaffId(1)));
    }

    #[test]
    fn service_spanning_adjacent_shifts_keeps_one_token() {
        let config = bank_config(2.9, vec![agenda(&[(0.0, 1.0), (1.0, 3.0)])], &[0.5, 1.5]);
        let (mut simulation, bank) = open_bank(config);
        simulation.run_until(2.9).unwrap();

        let customers = bank.customers();
        assert!(customers.iter().all(Customer::is_satisfied));
        assert_eq!(customers[1].waiting_time, 0.0);
        assert_eq!(bank.staff()[0].served(), ids(1..=2));
        assert_eq!(bank.available().len(), 1);
    }

    #[test]
    fn two_staff_share_the_queue() {
        let agendas = vec![agenda(&[(0.0, 10.0)]), agenda(&[(0.0, 10.0)])];
        let config = bank_config(5.0, agendas, &[0.0, 0.0, 0.0]);
        let (mut simulation, bank) = open_bank(config);
        simulation.run_until(5.0).unwrap();

        let report = bank.report();
        assert_eq!(report.satisfied, 3);
        let served: usize = report.served_by.iter().map(|s| s.customers.len()).sum();
        assert_eq!(served, 3);
        assert_eq!(bank.customers()[2].waiting_time, 1.0);
        assert_eq!(bank.available().len(), 2);
        assert_eq!(bank.available().pending_puts(), 0);
    }

    #[test]
    fn observer_sees_shifts_and_balks() {
        let mut config = bank_config(5.0, vec![agenda(&[(0.0, 3.0)])], &[0.0, 0.0]);
        config.mean_service = 2.0;
        config.mean_patience = 1.0;
        let recorder = Rc::new(RefCell::new(Recorder::default()));

        let mut simulation = Simulation::from_config(&config.sim);
        let bank = BankBuilder::new(config)
            .variates(FixedVariates)
            .observer(Rc::clone(&recorder))
            .build(&simulation.handle())
            .unwrap();
        bank.open();
        simulation.run_until(5.0).unwrap();

        let recorder = recorder.borrow();
        assert_eq!(recorder.on_duty, vec![(t(0.0), StaffId(1))]);
        assert_eq!(recorder.off_duty, vec![(t(3.0), StaffId(1))]);
        assert_eq!(recorder.balks, vec![(t(1.0), CustomerId(2))]);
    }

    #[test]
    fn invalid_config_is_rejected_by_the_builder() {
        let mut config = BankConfig::default();
        config.agendas.clear();
        let simulation = Simulation::new(0.0);
        let result = BankBuilder::new(config).build(&simulation.handle());
        assert!(matches!(result, Err(ModelError::Config(_))));
    }

    #[test]
    fn default_bank_runs_to_its_end_time() {
        let report = run_bank(BankBuilder::new(BankConfig::default()).observer(NoopObserver)).unwrap();
        assert_eq!(report.final_time, t(11.0));
        assert_eq!(report.total, report.satisfied + report.unsatisfied);
    }

    #[test]
    fn replications_follow_seed_order() {
        let config = BankConfig::default();
        let reports = replicate(&config, &[1, 2, 1]).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0], reports[2]);

        let summary = ReplicationSummary::new(&reports);
        assert_eq!(summary.runs, 3);
    }
}

// ── Post office ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod post {
    use super::*;

    fn post_config(duration: f64, interarrival: f64, service: f64, agendas: Vec<Agenda>) -> PostConfig {
        PostConfig {
            sim: SimConfig { start_time: 0.0, duration, seed: 1 },
            mean_interarrival: interarrival,
            service_range: (service, service),
            agendas,
        }
    }

    #[test]
    fn client_taken_before_close_is_served_past_it() {
        let config = post_config(2.0, 0.25, 0.5, vec![agenda(&[(0.0, 1.0)])]);
        let recorder = Rc::new(RefCell::new(Recorder::default()));

        let mut simulation = Simulation::from_config(&config.sim);
        let office = PostBuilder::new(config)
            .variates(FixedVariates)
            .observer(Rc::clone(&recorder))
            .build(&simulation.handle())
            .unwrap();
        office.open();
        simulation.run_until(2.0).unwrap();

        let report = office.report();
        assert_eq!(report.arrived, 8);
        assert_eq!(report.per_window[0].clients, ids(1..=2));
        assert_eq!(report.served, 2);
        assert_eq!(report.waiting, 6);
        assert!(!office.windows()[0].is_open());

        let recorder = recorder.borrow();
        assert_eq!(recorder.opened, vec![(t(0.0), WindowId(1))]);
        assert_eq!(recorder.closed, vec![(t(1.25), WindowId(1))]);
    }

    #[test]
    fn waiting_clients_are_served_when_the_next_shift_opens() {
        let config = post_config(2.0, 0.75, 0.1, vec![agenda(&[(0.0, 0.5), (1.0, 2.0)])]);
        let recorder = Rc::new(RefCell::new(Recorder::default()));

        let mut simulation = Simulation::from_config(&config.sim);
        let office = PostBuilder::new(config)
            .variates(FixedVariates)
            .observer(Rc::clone(&recorder))
            .build(&simulation.handle())
            .unwrap();
        office.open();
        simulation.run_until(2.0).unwrap();

        assert_eq!(office.windows()[0].served(), ids(1..=2));
        let recorder = recorder.borrow();
        assert_eq!(recorder.opened, vec![(t(0.0), WindowId(1)), (t(1.0), WindowId(1))]);
        assert_eq!(recorder.closed[0], (t(0.5), WindowId(1)));
    }

    #[test]
    fn default_post_office_runs() {
        let report = run_post(PostBuilder::new(PostConfig::default()).observer(NoopObserver)).unwrap();
        assert_eq!(report.final_time, t(13.0));
        assert_eq!(report.arrived, report.served + report.in_service + report.waiting);
    }
}

// ── Charging ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod charging {
    use super::*;
    use crate::CarAction::*;

    #[test]
    fn interrupt_cuts_the_first_charge_short() {
        let log = run_charging(&ChargingConfig::default()).unwrap();
        let expected = vec![
            (t(0.0), Charging),
            (t(3.0), Interrupted),
            (t(3.0), Driving),
            (t(5.0), Charging),
            (t(10.0), Driving),
            (t(12.0), Charging),
            (t(17.0), Driving),
            (t(19.0), Charging),
        ];
        assert_eq!(log, expected);
    }

    #[test]
    fn without_a_driver_the_car_cycles() {
        let config = ChargingConfig { interrupt_after: None, ..ChargingConfig::default() };
        let log = run_charging(&config).unwrap();
        let times: Vec<f64> = log.iter().map(|(time, _)| time.as_f64()).collect();
        assert_eq!(times, vec![0.0, 5.0, 7.0, 12.0, 14.0, 19.0]);
        assert!(!log.iter().any(|(_, action)| *action == Interrupted));
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use super::*;

    #[test]
    fn null_patience_means_infinite() {
        let config = BankConfig::from_json_reader(r#"{ "mean_patience": null }"#.as_bytes()).unwrap();
        assert!(config.mean_patience.is_infinite());
        assert_eq!(config.agendas, BankConfig::default().agendas);
    }

    #[test]
    fn json_round_trip_keeps_infinite_patience() {
        let config = BankConfig { mean_patience: f64::INFINITY, ..BankConfig::default() };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""mean_patience":null"#));
        let back = BankConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn agendas_parse_from_shift_objects() {
        let json = r#"{ "agendas": [[{ "start": 1.0, "end": 2.0 }, { "start": 3.0, "end": 4.0 }]] }"#;
        let config = PostConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(config.agendas, vec![agenda(&[(1.0, 2.0), (3.0, 4.0)])]);
    }

    #[test]
    fn overlapping_shifts_fail_to_parse() {
        let json = r#"{ "agendas": [[{ "start": 1.0, "end": 3.0 }, { "start": 2.0, "end": 4.0 }]] }"#;
        assert!(matches!(BankConfig::from_json_reader(json.as_bytes()), Err(ModelError::Json(_))));
    }

    #[test]
    fn charging_config_loads_and_validates() {
        let json = r#"{ "charge_duration": 4.0, "interrupt_after": null }"#;
        let config = ChargingConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(config.charge_duration, 4.0);
        assert_eq!(config.interrupt_after, None);
        assert_eq!(config.trip_duration, ChargingConfig::default().trip_duration);

        let bad = r#"{ "trip_duration": 0.0 }"#;
        assert!(matches!(ChargingConfig::from_json_reader(bad.as_bytes()), Err(ModelError::Config(_))));
    }

    #[test]
    fn validation_errors() {
        let bad_mean = BankConfig { mean_service: 0.0, ..BankConfig::default() };
        assert!(matches!(bad_mean.validate(), Err(ModelError::Config(_))));

        let unsorted = BankConfig { arrival_times: Some(vec![2.0, 1.0]), ..BankConfig::default() };
        assert!(matches!(unsorted.validate(), Err(ModelError::Config(_))));

        let inverted = PostConfig { service_range: (2.0, 1.0), ..PostConfig::default() };
        assert!(matches!(inverted.validate(), Err(ModelError::Config(_))));

        let negative = ChargingConfig { interrupt_after: Some(-1.0), ..ChargingConfig::default() };
        assert!(matches!(negative.validate(), Err(ModelError::Config(_))));

        let mut sim = BankConfig::default();
        sim.sim.duration = -1.0;
        assert!(matches!(sim.validate(), Err(ModelError::Core(_))));
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod reports {
    use super::*;

    fn customer(id: u32, arrival: f64, state: CustomerState, waiting: f64, total: f64) -> Customer {
        Customer {
            state,
            waiting_time: waiting,
            total_time: total,
            ..Customer::new(CustomerId(id), t(arrival), f64::INFINITY)
        }
    }

    #[test]
    fn bank_report_counts_and_means() {
        let customers = vec![
            customer(1, 0.0, CustomerState::Satisfied, 1.0, 3.0),
            customer(2, 0.0, CustomerState::Satisfied, 3.0, 5.0),
            customer(3, 1.0, CustomerState::Balked, 2.0, 0.0),
            customer(4, 8.0, CustomerState::Waiting, 0.0, 0.0),
        ];
        let served = vec![(StaffId(1), ids(1..=2))];
        let report = BankReport::new(&customers, &served, t(10.0));

        assert_eq!(report.total, 4);
        assert_eq!(report.satisfied, 2);
        assert_eq!(report.unsatisfied, 2);
        assert_eq!(report.balked, 1);
        assert_eq!(report.still_waiting, 1);
        assert_eq!(report.satisfied_percent, 50.0);
        // 1 + 3 + 2 + (10 - 8)
        assert_eq!(report.average_waiting_time, 2.0);
        assert_eq!(report.average_total_time, 4.0);
    }

    #[test]
    fn empty_report_has_zero_means() {
        let report = BankReport::new(&[], &[], t(0.0));
        assert_eq!(report.satisfied_percent, 0.0);
        assert_eq!(report.average_waiting_time, 0.0);
        assert_eq!(report.average_total_time, 0.0);
    }

    #[test]
    fn report_display_lists_staff_and_totals() {
        let customers = vec![customer(1, 0.0, CustomerState::Satisfied, 0.0, 0.5)];
        let report = BankReport::new(&customers, &[(StaffId(1), ids(1..=1))], t(1.0));
        let text = report.to_string();
        assert!(text.contains("served customers [1]"));
        assert!(text.contains("Customers in total:\t1"));
        assert!(text.contains("Average time in bank (satisfied), min:\t30.00"));
    }
}
