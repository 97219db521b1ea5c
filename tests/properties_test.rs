use proptest::prelude::*;

use tickos::hw::inst::Instruction;
use tickos::os::pcb::{LoadOptions, Pcb};
use tickos::{compile, AlgorithmKind, Computer, MachineConfig, Pid, ProcessState, Program};

fn source_line() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "CPU", "cpu", "IO", "EXIT", "exit", "CPU 3", "IO 2", "# comment", "", "  CPU  # trailing",
    ])
}

fn state() -> impl Strategy<Value = ProcessState> {
    prop::sample::select(ProcessState::ALL.to_vec())
}

fn algorithm() -> impl Strategy<Value = AlgorithmKind> {
    prop::sample::select(AlgorithmKind::ALL.to_vec())
}

fn workload() -> impl Strategy<Value = Vec<Vec<Instruction>>> {
    let inst = prop::sample::select(vec![Instruction::Cpu, Instruction::Io, Instruction::Exit]);
    prop::collection::vec(prop::collection::vec(inst, 0..6), 1..6)
}

proptest! {
    #[test]
    fn compiled_programs_end_with_one_exit_test(lines in prop::collection::vec(source_line(), 0..20)) {
        let program = compile("p", &lines.join("\n")).unwrap();
        let insts = program.instructions();
        prop_assert_eq!(1, insts.iter().filter(|i| i.is_exit()).count());
        prop_assert_eq!(Some(&Instruction::Exit), insts.last());
        prop_assert!(insts.iter().all(|i| i.is_valid()));
    }

    #[test]
    fn illegal_transitions_leave_state_unchanged_test(targets in prop::collection::vec(state(), 1..30)) {
        let mut pcb = Pcb::new(Pid(1), 0, 1, 0, LoadOptions::default());
        for to in targets {
            let from = pcb.state();
            let res = pcb.transition_to(to);
            if from.can_transition_to(to) {
                prop_assert!(res.is_ok());
                prop_assert_eq!(to, pcb.state());
            } else {
                prop_assert!(res.is_err());
                prop_assert_eq!(from, pcb.state());
            }
        }
    }

    #[test]
    fn at_most_one_running_process_test(
        programs in workload(),
        kind in algorithm(),
        ticks in 1u64..60,
        seed in any::<u64>(),
    ) {
        let mut config = MachineConfig::default();
        config.hardware.memory_size = 200;
        config.hardware.seed = seed;
        config.kernel.algorithm = kind;
        let mut computer = Computer::new(&config).unwrap();
        for (i, insts) in programs.into_iter().enumerate() {
            computer.load_program(Program::new(format!("w{i}"), insts)).unwrap();
        }
        for _ in 0..ticks {
            let report = computer.tick();
            prop_assert!(report.faults.is_empty(), "{:?}", report.faults);
            let kernel = computer.kernel();
            let running: Vec<Pid> = kernel
                .process_table()
                .pcbs()
                .filter(|p| p.state() == ProcessState::Running)
                .map(|p| p.pid())
                .collect();
            prop_assert!(running.len() <= 1);
            prop_assert_eq!(running.first().copied(), kernel.running_pid());
            prop_assert_eq!(kernel.running_pid().is_some(), computer.hardware().cpu().is_busy());
        }
    }
}
