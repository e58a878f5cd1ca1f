//! Unit tests for the kernel: ordering, events, processes, conditions, stores.

use std::cell::RefCell;
use std::rc::Rc;

use qs_core::SimTime;

use crate::{Sim, Simulation};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn setup() -> (Simulation, Sim) {
    let simulation = Simulation::new(0.0);
    let sim = simulation.handle();
    (simulation, sim)
}

type Log<T> = Rc<RefCell<Vec<T>>>;

fn log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

fn t(v: f64) -> SimTime {
    SimTime(v)
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler {
    use super::*;
    use crate::{KernelError, RunOutcome};

    #[test]
    fn entries_fire_in_time_order() {
        let (mut simulation, sim) = setup();
        let seen = log();
        for (label, delay) in [("c", 3.0), ("a", 1.0), ("b", 2.0)] {
            let (ctx, seen) = (sim.clone(), seen.clone());
            sim.process(async move {
                ctx.timeout(delay)?.wait().await?;
                seen.borrow_mut().push((ctx.now(), label));
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![(t(1.0), "a"), (t(2.0), "b"), (t(3.0), "c")]);
    }

    #[test]
    fn equal_times_fire_in_insertion_order() {
        let (mut simulation, sim) = setup();
        let seen = log();
        for label in ["first", "second", "third"] {
            let (ctx, seen) = (sim.clone(), seen.clone());
            sim.process(async move {
                ctx.timeout(1.0)?.wait().await?;
                seen.borrow_mut().push(label);
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn run_until_stops_at_deadline() {
        let (mut simulation, sim) = setup();
        let _timer = sim.timeout(5.0).unwrap();

        assert_eq!(simulation.run_until(3.0), Ok(RunOutcome::DeadlineReached));
        assert_eq!(simulation.now(), t(3.0));
        assert_eq!(simulation.peek(), Some(t(5.0)));

        assert_eq!(simulation.run_until(10.0), Ok(RunOutcome::Exhausted));
        assert_eq!(simulation.now(), t(5.0));
    }

    #[test]
    fn entries_at_the_deadline_fire() {
        let (mut simulation, sim) = setup();
        let timer = sim.timeout(3.0).unwrap();
        assert_eq!(simulation.run_until(3.0), Ok(RunOutcome::Exhausted));
        assert!(timer.is_processed());
    }

    #[test]
    fn deadline_in_the_past_is_rejected() {
        let mut simulation = Simulation::new(5.0);
        assert_eq!(
            simulation.run_until(1.0),
            Err(KernelError::DeadlineInPast { deadline: t(1.0), now: t(5.0) })
        );
    }

    #[test]
    fn invalid_delays_are_rejected() {
        let (_simulation, sim) = setup();
        assert_eq!(sim.timeout(-1.0).unwrap_err(), KernelError::InvalidDelay { delay: -1.0 });
        assert!(sim.timeout(f64::NAN).is_err());
        assert!(sim.timeout(f64::INFINITY).is_err());
        assert_eq!(sim.pending_entries(), 0);
    }

    #[test]
    fn step_executes_one_entry() {
        let (mut simulation, sim) = setup();
        let _a = sim.timeout(1.0).unwrap();
        let _b = sim.timeout(2.0).unwrap();
        assert_eq!(simulation.step(), Some(t(1.0)));
        assert_eq!(simulation.now(), t(1.0));
        assert_eq!(simulation.step(), Some(t(2.0)));
        assert_eq!(simulation.step(), None);
        assert_eq!(simulation.stats().entries_executed, 2);
        assert_eq!(simulation.stats().events_processed, 2);
    }

    #[test]
    fn starts_at_configured_time() {
        let config = qs_core::SimConfig { start_time: 9.0, duration: 1.0, seed: 0 };
        let simulation = Simulation::from_config(&config);
        assert_eq!(simulation.now(), t(9.0));
    }

    #[test]
    fn dropping_the_simulation_frees_the_kernel() {
        let (mut simulation, sim) = setup();
        let ctx = sim.clone();
        sim.process(async move {
            let a = ctx.timeout(5.0)?;
            let b = ctx.timeout(7.0)?;
            ctx.race(&a, &b).wait().await?;
            Ok(())
        });
        simulation.step();
        let kernel = Rc::downgrade(&sim.kernel);
        drop(sim);
        drop(simulation);
        assert!(kernel.upgrade().is_none());
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod events {
    use super::*;
    use crate::{Fault, KernelError};

    #[test]
    fn triggering_twice_is_an_error() {
        let (mut simulation, sim) = setup();
        let event = sim.event::<u32>();
        assert!(event.succeed(1).is_ok());
        assert_eq!(event.succeed(2), Err(KernelError::DoubleFire { event: event.id() }));
        assert_eq!(
            event.fail(Fault::failed("late")),
            Err(KernelError::DoubleFire { event: event.id() })
        );
        simulation.run();
        assert_eq!(event.value(), Some(Ok(1)));
    }

    #[test]
    fn triggering_does_not_run_waiters_inline() {
        let (mut simulation, sim) = setup();
        let event = sim.event::<&str>();
        let seen = log();
        {
            let (event, seen) = (event.clone(), seen.clone());
            sim.process(async move {
                let value = event.wait().await?;
                seen.borrow_mut().push(value);
                Ok(())
            });
        }
        simulation.step();
        event.succeed("hello").unwrap();
        assert!(event.is_triggered());
        assert!(!event.is_processed());
        assert!(seen.borrow().is_empty());

        simulation.run();
        assert_eq!(*seen.borrow(), vec!["hello"]);
    }

    #[test]
    fn waiters_resume_in_registration_order() {
        let (mut simulation, sim) = setup();
        let event = sim.event::<()>();
        let seen = log();
        for label in 0..4 {
            let (event, seen) = (event.clone(), seen.clone());
            sim.process(async move {
                event.wait().await?;
                seen.borrow_mut().push(label);
                Ok(())
            });
        }
        sim.schedule(2.0, &event, ()).unwrap();
        simulation.run();
        assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn waiting_on_a_processed_event_yields_first() {
        let (mut simulation, sim) = setup();
        let event = sim.event::<u32>();
        event.succeed(7).unwrap();
        let seen = log();
        {
            let (event, seen) = (event.clone(), seen.clone());
            sim.process(async move {
                let value = event.wait().await?;
                seen.borrow_mut().push(format!("A{value}"));
                Ok(())
            });
        }
        {
            let seen = seen.clone();
            sim.process(async move {
                seen.borrow_mut().push("B".to_string());
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec!["B".to_string(), "A7".to_string()]);
    }

    #[test]
    fn failure_reaches_waiters() {
        let (mut simulation, sim) = setup();
        let event = sim.event::<u32>();
        let seen = log();
        {
            let (event, seen) = (event.clone(), seen.clone());
            sim.process(async move {
                seen.borrow_mut().push(event.wait().await);
                Ok(())
            });
        }
        event.fail(Fault::failed("broken")).unwrap();
        simulation.run();
        assert_eq!(*seen.borrow(), vec![Err(Fault::Failed("broken".into()))]);
    }
}

// ── Processes ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod processes {
    use super::*;
    use crate::{Fault, KernelError, ProcessState};
    use qs_core::ProcessId;

    #[test]
    fn process_returns_value_to_waiter() {
        let (mut simulation, sim) = setup();
        let ctx = sim.clone();
        let child = sim.process(async move {
            ctx.timeout(2.0)?.wait().await?;
            Ok(42_u32)
        });
        let seen = log();
        {
            let (ctx, seen, child) = (sim.clone(), seen.clone(), child.clone());
            sim.process(async move {
                let value = child.wait().await?;
                seen.borrow_mut().push((ctx.now(), value));
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![(t(2.0), 42)]);
        assert_eq!(child.state(), ProcessState::Done);
        assert!(!child.is_alive());
        assert_eq!(simulation.stats().processes_spawned, 2);
        assert_eq!(simulation.stats().processes_finished, 2);
    }

    #[test]
    fn failed_process_fails_its_event() {
        let (mut simulation, sim) = setup();
        let child = sim.process(async move { Err::<(), _>(Fault::failed("boom")) });
        let seen = log();
        {
            let (seen, child) = (seen.clone(), child.clone());
            sim.process(async move {
                seen.borrow_mut().push(child.wait().await);
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![Err(Fault::Failed("boom".into()))]);
        assert_eq!(child.state(), ProcessState::Failed);
    }

    #[test]
    fn state_tracks_life_cycle() {
        let (mut simulation, sim) = setup();
        let ctx = sim.clone();
        let timer = sim.timeout(4.0).unwrap();
        let waiting_on = timer.id();
        let process = sim.process(async move {
            timer.wait().await?;
            ctx.timeout(1.0)?.wait().await?;
            Ok(())
        });
        assert_eq!(process.state(), ProcessState::Pending);
        simulation.run_until(1.0).unwrap();
        assert_eq!(process.state(), ProcessState::Suspended { awaiting: waiting_on });
        simulation.run();
        assert_eq!(process.state(), ProcessState::Done);
    }

    #[test]
    fn interrupt_resumes_target_at_current_time() {
        let (mut simulation, sim) = setup();
        let seen = log();
        let timer = sim.timeout(5.0).unwrap();
        let target = {
            let (ctx, seen, timer) = (sim.clone(), seen.clone(), timer.clone());
            sim.process(async move {
                match timer.wait().await {
                    Err(Fault::Interrupt(interrupt)) => {
                        seen.borrow_mut().push((ctx.now(), interrupt.cause));
                    }
                    other => {
                        other?;
                        seen.borrow_mut().push((ctx.now(), "timer".to_string()));
                    }
                }
                Ok(())
            })
        };
        {
            let (ctx, target) = (sim.clone(), target.clone());
            sim.process(async move {
                ctx.timeout(3.0)?.wait().await?;
                target.interrupt("stop")?;
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![(t(3.0), "stop".to_string())]);
        // The timer still fired for nobody.
        assert!(timer.is_processed());
        assert_eq!(simulation.now(), t(5.0));
    }

    #[test]
    fn interrupt_errors() {
        let (mut simulation, sim) = setup();
        let seen = log();
        let process = {
            let (ctx, seen) = (sim.clone(), seen.clone());
            sim.process(async move {
                let me = ctx.active_process().ok_or_else(|| Fault::failed("not running"))?;
                seen.borrow_mut().push(ctx.interrupt(me, "self"));
                Ok(())
            })
        };
        simulation.run();
        assert_eq!(*seen.borrow(), vec![Err(KernelError::SelfInterrupt(process.id()))]);
        assert_eq!(process.interrupt("late"), Err(KernelError::ProcessFinished(process.id())));
        assert_eq!(
            sim.interrupt(ProcessId(999), "nobody"),
            Err(KernelError::UnknownProcess(ProcessId(999)))
        );
    }

    #[test]
    fn unhandled_interrupt_fails_the_process() {
        let (mut simulation, sim) = setup();
        let ctx = sim.clone();
        let target = sim.process(async move {
            ctx.timeout(10.0)?.wait().await?;
            Ok(())
        });
        simulation.step();
        target.interrupt("cut").unwrap();
        assert_eq!(target.state(), ProcessState::Interrupted);
        simulation.run();
        assert_eq!(target.state(), ProcessState::Failed);
        assert!(matches!(target.event().value(), Some(Err(ref fault)) if fault.is_interrupt()));
    }
}

// ── Conditions ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod conditions {
    use super::*;
    use crate::{Fault, Race};

    #[test]
    fn race_resolves_at_the_earlier_event() {
        let (mut simulation, sim) = setup();
        let seen = log();
        let (ctx, out) = (sim.clone(), seen.clone());
        sim.process(async move {
            let a = ctx.timeout_with(3.0, "a")?;
            let b = ctx.timeout_with(5.0, "b")?;
            let winner = ctx.race(&a, &b).wait().await?;
            out.borrow_mut().push((ctx.now(), winner));
            Ok(())
        });
        simulation.run();
        assert_eq!(*seen.borrow(), vec![(t(3.0), Race::First("a"))]);
    }

    #[test]
    fn race_reports_ties() {
        let (mut simulation, sim) = setup();
        let seen = log();
        let (ctx, out) = (sim.clone(), seen.clone());
        sim.process(async move {
            let a = ctx.timeout_with(3.0, 1_u32)?;
            let b = ctx.timeout_with(3.0, "b")?;
            let winner = ctx.race(&a, &b).wait().await?;
            out.borrow_mut().push((ctx.now(), winner));
            Ok(())
        });
        simulation.run();
        let seen = seen.borrow();
        assert_eq!(seen[0], (t(3.0), Race::Both(1, "b")));
        assert_eq!(seen[0].1.first(), Some(&1));
        assert_eq!(seen[0].1.second(), Some(&"b"));
    }

    #[test]
    fn race_second_wins() {
        let (mut simulation, sim) = setup();
        let a = sim.timeout_with(4.0, 'a').unwrap();
        let b = sim.timeout_with(1.0, 'b').unwrap();
        let race = sim.race(&a, &b);
        simulation.run();
        assert_eq!(race.value(), Some(Ok(Race::Second('b'))));
    }

    #[test]
    fn race_fails_when_a_constituent_fails() {
        let (mut simulation, sim) = setup();
        let a = sim.event::<()>();
        let b = sim.timeout(5.0).unwrap();
        let race = sim.race(&a, &b);
        a.fail(Fault::failed("lost")).unwrap();
        simulation.run();
        assert_eq!(race.value(), Some(Err(Fault::Failed("lost".into()))));
    }

    #[test]
    fn race_over_an_already_processed_event() {
        let (mut simulation, sim) = setup();
        let a = sim.timeout_with(0.0, 1).unwrap();
        simulation.run();
        let b = sim.timeout_with(5.0, 2).unwrap();
        let race = sim.race(&a, &b);
        simulation.run_until(1.0).unwrap();
        assert_eq!(race.value(), Some(Ok(Race::First(1))));
    }

    #[test]
    fn any_of_reports_everything_fired_at_that_instant() {
        let (mut simulation, sim) = setup();
        let events = vec![
            sim.timeout_with(2.0, "slow").unwrap(),
            sim.timeout_with(1.0, "x").unwrap(),
            sim.timeout_with(1.0, "y").unwrap(),
        ];
        let any = sim.any_of(&events);
        simulation.run_until(1.0).unwrap();
        let fired = any.value().unwrap().unwrap();
        assert_eq!(fired.indices().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(fired.get(2), Some(&"y"));
        assert!(!fired.contains(0));
    }

    #[test]
    fn any_of_empty_fires_immediately() {
        let (mut simulation, sim) = setup();
        let seen = log();
        let (ctx, out) = (sim.clone(), seen.clone());
        sim.process(async move {
            let fired = ctx.any_of::<u8>(&[]).wait().await?;
            out.borrow_mut().push((ctx.now(), fired.len()));
            Ok(())
        });
        simulation.run();
        assert_eq!(*seen.borrow(), vec![(t(0.0), 0)]);
    }

    #[test]
    fn all_of_waits_for_every_event() {
        let (mut simulation, sim) = setup();
        let events: Vec<_> = [3.0, 1.0, 2.0]
            .into_iter()
            .map(|d| sim.timeout_with(d, d).unwrap())
            .collect();
        let all = sim.all_of(&events);
        simulation.run_until(2.5).unwrap();
        assert!(all.value().is_none());
        simulation.run();
        let fired = all.value().unwrap().unwrap();
        assert_eq!(fired.into_values().collect::<Vec<_>>(), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn losers_still_fire_for_other_waiters() {
        let (mut simulation, sim) = setup();
        let fast = sim.timeout(1.0).unwrap();
        let slow = sim.timeout(2.0).unwrap();
        let _race = sim.race(&fast, &slow);
        let seen = log();
        {
            let (ctx, slow, seen) = (sim.clone(), slow.clone(), seen.clone());
            sim.process(async move {
                slow.wait().await?;
                seen.borrow_mut().push(ctx.now());
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![t(2.0)]);
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use super::*;
    use crate::{Fault, Race, Store};

    #[test]
    fn getters_are_served_in_request_order() {
        let (mut simulation, sim) = setup();
        let store = Store::<&str>::unbounded(&sim);
        let seen = log();
        for getter in 0..3 {
            let (ctx, store, seen) = (sim.clone(), store.clone(), seen.clone());
            sim.process(async move {
                let item = store.get().wait().await?;
                seen.borrow_mut().push((getter, item, ctx.now()));
                Ok(())
            });
        }
        {
            let (ctx, store) = (sim.clone(), store.clone());
            sim.process(async move {
                ctx.timeout(1.0)?.wait().await?;
                store.put("x");
                store.put("y");
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![(0, "x", t(1.0)), (1, "y", t(1.0))]);
        assert_eq!(store.pending_gets(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn waiting_getters_are_served_in_order_whatever_the_put_order() {
        let (mut simulation, sim) = setup();
        let store = Store::unbounded(&sim);
        let seen = log();
        for name in ["A", "B", "C"] {
            let (ctx, store, seen) = (sim.clone(), store.clone(), seen.clone());
            sim.process(async move {
                let item = store.get().wait().await?;
                seen.borrow_mut().push((name, item, ctx.now()));
                Ok(())
            });
        }
        // Putters are started out of time order.
        for (at, item) in [(3.0, 30), (1.0, 10), (2.0, 20)] {
            let (ctx, store) = (sim.clone(), store.clone());
            sim.process(async move {
                ctx.timeout(at)?.wait().await?;
                store.put(item).wait().await?;
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec![("A", 10, t(1.0)), ("B", 20, t(2.0)), ("C", 30, t(3.0))]);
        assert_eq!(store.pending_gets(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn front_request_is_granted_before_older_getters() {
        let (_simulation, sim) = setup();
        let store = Store::unbounded(&sim);
        let older = store.get();
        let newer = store.get();
        let first = store.get_first();
        assert_eq!(store.pending_gets(), 3);

        let _ = store.put('a');
        assert!(first.is_granted());
        assert!(!older.is_granted());
        let _ = store.put('b');
        assert!(older.is_granted());
        assert!(!newer.is_granted());
        assert_eq!(first.claim(), Some('a'));
        assert_eq!(older.claim(), Some('b'));
        newer.cancel();
        assert_eq!(store.pending_gets(), 0);
    }

    #[test]
    fn capacity_blocks_puts_until_room() {
        let (mut simulation, sim) = setup();
        let store = Store::new(&sim, 1);
        let first = store.put('a');
        let second = store.put('b');
        assert_eq!(store.len(), 1);
        assert_eq!(store.pending_puts(), 1);

        let get = store.get();
        assert!(get.is_granted());
        assert_eq!(get.claim(), Some('a'));
        assert_eq!(store.items(), vec!['b']);
        assert_eq!(store.pending_puts(), 0);

        simulation.run();
        assert!(first.is_processed());
        assert!(second.is_processed());
    }

    #[test]
    fn withdraw_removes_first_match() {
        let (_simulation, sim) = setup();
        let store = Store::unbounded(&sim);
        for item in [1, 2, 3, 2] {
            let _ = store.put(item);
        }
        assert_eq!(store.withdraw(|x| *x == 2), Some(2));
        assert_eq!(store.items(), vec![1, 3, 2]);
        assert_eq!(store.withdraw(|x| *x == 9), None);
    }

    #[test]
    fn cancelling_a_pending_get_leaves_the_queue() {
        let (_simulation, sim) = setup();
        let store = Store::<u8>::unbounded(&sim);
        let get = store.get();
        assert_eq!(store.pending_gets(), 1);
        get.cancel();
        assert_eq!(store.pending_gets(), 0);
        let _ = store.put(1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn dropping_an_unclaimed_grant_restores_the_item() {
        let (_simulation, sim) = setup();
        let store = Store::unbounded(&sim);
        let _ = store.put(10);
        let _ = store.put(20);
        let get = store.get();
        assert!(get.is_granted());
        assert_eq!(store.items(), vec![20]);
        drop(get);
        assert_eq!(store.items(), vec![10, 20]);
    }

    #[test]
    fn restored_item_goes_to_the_next_getter() {
        let (_simulation, sim) = setup();
        let store = Store::unbounded(&sim);
        let first = store.get();
        let second = store.get();
        let _ = store.put("token");
        assert!(first.is_granted());
        assert!(!second.is_granted());
        first.cancel();
        assert!(second.is_granted());
        assert_eq!(second.claim(), Some("token"));
        assert!(store.is_empty());
    }

    #[test]
    fn timed_out_getter_does_not_swallow_a_simultaneous_grant() {
        let (mut simulation, sim) = setup();
        let store = Store::<&str>::unbounded(&sim);
        let seen = log();
        {
            let (ctx, store, seen) = (sim.clone(), store.clone(), seen.clone());
            sim.process(async move {
                let get = store.get();
                let patience = ctx.timeout(2.0)?;
                match ctx.race(get.event(), &patience).wait().await? {
                    Race::First(_) | Race::Both(..) => {
                        let item = get.claim().ok_or_else(|| Fault::failed("no grant"))?;
                        seen.borrow_mut().push(format!("served {item}"));
                    }
                    Race::Second(()) => {
                        get.cancel();
                        seen.borrow_mut().push("balked".to_string());
                    }
                }
                Ok(())
            });
        }
        {
            let (ctx, store) = (sim.clone(), store.clone());
            sim.process(async move {
                ctx.timeout(2.0)?.wait().await?;
                store.put("token");
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(*seen.borrow(), vec!["balked".to_string()]);
        assert_eq!(store.items(), vec!["token"]);
        assert_eq!(store.pending_gets(), 0);
    }

    #[test]
    fn single_token_goes_only_to_getters_that_waited() {
        let (mut simulation, sim) = setup();
        let store = Store::new(&sim, 1);
        let _ = store.put("token");
        let served = log();
        let balked = log();
        let getters = 20;
        for getter in 0..getters {
            let (ctx, store) = (sim.clone(), store.clone());
            let (served, balked) = (served.clone(), balked.clone());
            sim.process(async move {
                ctx.timeout(f64::from(getter) * 0.5)?.wait().await?;
                let get = store.get();
                let patience = ctx.timeout(1.0)?;
                let race = ctx.race(get.event(), &patience).wait().await?;
                if race.first().is_none() {
                    get.cancel();
                    balked.borrow_mut().push(getter);
                    return Ok(());
                }
                let token = get.claim().ok_or_else(|| Fault::failed("no grant"))?;
                served.borrow_mut().push(getter);
                ctx.timeout(1.5)?.wait().await?;
                store.put(token).wait().await?;
                Ok(())
            });
        }
        simulation.run();

        let served = served.borrow();
        let balked = balked.borrow();
        assert!(!served.is_empty());
        assert!(!balked.is_empty());
        assert!(served.iter().all(|g| !balked.contains(g)));
        let mut everyone: Vec<u32> = served.iter().chain(balked.iter()).copied().collect();
        everyone.sort_unstable();
        assert_eq!(everyone, (0..getters).collect::<Vec<_>>());
        assert_eq!(store.items(), vec!["token"]);
        assert_eq!(store.pending_gets(), 0);
    }

    #[test]
    fn interrupted_get_is_withdrawn() {
        let (mut simulation, sim) = setup();
        let store = Store::<u8>::unbounded(&sim);
        let getter = {
            let store = store.clone();
            sim.process(async move {
                let result = store.get().wait().await;
                assert!(matches!(result, Err(Fault::Interrupt(_))));
                Ok(())
            })
        };
        {
            let (ctx, getter) = (sim.clone(), getter.clone());
            sim.process(async move {
                ctx.timeout(1.0)?.wait().await?;
                getter.interrupt("closing")?;
                Ok(())
            });
        }
        simulation.run();
        assert_eq!(store.pending_gets(), 0);
        let _ = store.put(1);
        assert_eq!(store.len(), 1);
    }
}
