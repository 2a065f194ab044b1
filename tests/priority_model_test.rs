// ==========================================
// 优先级评分集成测试
// ==========================================
// 覆盖: 查表评分决定出队顺序、查表缺失诊断、预设分值、权重为 0 的并列
// ==========================================


use test_helpers::*;
use vaccination_aps::config::{ScheduleConfig, ScoreCoupling};
use vaccination_aps::domain::{PatientAttributes, PatientRecord};
use vaccination_aps::engine::{
    PriorityDimension, PriorityModel, PriorityTable, PriorityTables, ScheduleInput,
    ScheduleOrchestrator,
};
use vaccination_aps::{DoseNumber, HealthFlag, Phase};

fn create_test_tables() -> PriorityTables {
    PriorityTables {
        age: PriorityTable::from_entries(PriorityDimension::Age, vec![(60, 1.0), (20, 3.0)]),
        role: PriorityTable::from_entries(
            PriorityDimension::Role,
            vec![("medico".to_string(), 1.0)],
        ),
        residence: PriorityTable::from_entries(
            PriorityDimension::Residence,
            vec![("Lima, Lima".to_string(), 1.0)],
        ),
        work_unit: PriorityTable::from_entries(
            PriorityDimension::WorkUnit,
            vec![("C1".to_string(), 1.0)],
        ),
    }
}

fn attributes(age: u32, role: &str) -> PatientAttributes {
    PatientAttributes {
        age: Some(age),
        role: Some(role.to_string()),
        department: Some("Lima".to_string()),
        municipality: Some("Lima".to_string()),
        work_unit: Some("C1".to_string()),
        prior_infection: HealthFlag::Absent,
        diabetes: HealthFlag::Absent,
        obesity: HealthFlag::Absent,
        cancer: HealthFlag::Absent,
        hiv: HealthFlag::Absent,
        renal: HealthFlag::Absent,
    }
}

/// 单名额: 评分最小者获得预约
fn create_single_slot_input(patients: Vec<PatientRecord>) -> ScheduleInput {
    let mut input = create_test_input(
        vec![create_test_clinic("C1", &[(Phase::N1a, 1)])],
        patients,
        vec![create_test_brand("X", 2, 4)],
        vec![create_test_lot("L1", "X", date(2021, 3, 1), 4)],
    );
    input.tables = create_test_tables();
    input
}

fn first_dose_patient(config: &ScheduleConfig, input: ScheduleInput) -> String {
    let run = ScheduleOrchestrator::new(config).run(input).unwrap();
    run.assignments
        .iter()
        .find(|a| a.dose_number == DoseNumber::First)
        .map(|a| a.patient_id.clone())
        .unwrap()
}

#[test]
fn test_table_scores_rank_older_patient_first() {
    let model = PriorityModel::new(Default::default(), ScoreCoupling::Legacy);
    let outcome = model.score_all(
        vec![
            create_scored_patient("JOVEN", "C1", attributes(25, "medico")),
            create_scored_patient("MAYOR", "C1", attributes(65, "medico")),
        ],
        &create_test_tables(),
    );

    assert!(outcome.lookup_misses.is_empty());
    // 年龄 1 + 3 个为正的因素 × 1
    assert_eq!(outcome.patients[1].score, 4.0);
    // 年龄 3 + 3 个为正的因素 × 3
    assert_eq!(outcome.patients[0].score, 12.0);

    let config = create_test_config(100, 0);
    let input = create_single_slot_input(vec![
        create_scored_patient("JOVEN", "C1", attributes(25, "medico")),
        create_scored_patient("MAYOR", "C1", attributes(65, "medico")),
    ]);
    assert_eq!(first_dose_patient(&config, input), "MAYOR");
}

#[test]
fn test_corrected_coupling_keeps_same_ranking() {
    let mut config = create_test_config(100, 0);
    config.policy.score_coupling = ScoreCoupling::Corrected;

    let model = PriorityModel::from_config(&config);
    let outcome = model.score_all(
        vec![create_scored_patient("JOVEN", "C1", attributes(25, "medico"))],
        &create_test_tables(),
    );
    assert_eq!(outcome.patients[0].score, 6.0);

    let input = create_single_slot_input(vec![
        create_scored_patient("JOVEN", "C1", attributes(25, "medico")),
        create_scored_patient("MAYOR", "C1", attributes(65, "medico")),
    ]);
    assert_eq!(first_dose_patient(&config, input), "MAYOR");
}

#[test]
fn test_lookup_misses_are_reported_not_fatal() {
    let config = create_test_config(100, 0);
    let mut no_age = attributes(40, "chofer");
    no_age.age = None;

    let input = create_single_slot_input(vec![
        create_scored_patient("P1", "C1", no_age),
        create_scored_patient("P2", "C1", attributes(65, "medico")),
    ]);
    let run = ScheduleOrchestrator::new(&config).run(input).unwrap();

    assert_eq!(run.summary.lookup_misses, 2);
    let dims: Vec<_> = run
        .lookup_misses
        .iter()
        .map(|m| (m.patient_id.as_str(), m.dimension, m.key.as_deref()))
        .collect();
    assert_eq!(
        dims,
        vec![
            ("P1", PriorityDimension::Age, None),
            ("P1", PriorityDimension::Role, Some("chofer")),
        ]
    );
    assert_eq!(run.summary.total_assignments, 2);
}

#[test]
fn test_preset_score_overrides_table_lookup() {
    let config = create_test_config(100, 0);
    let mut preset = create_scored_patient("EXTERNO", "C1", attributes(25, "chofer"));
    preset.preset_score = Some(0.5);

    let input = create_single_slot_input(vec![
        create_scored_patient("MAYOR", "C1", attributes(65, "medico")),
        preset,
    ]);
    let run = ScheduleOrchestrator::new(&config).run(input).unwrap();

    assert!(run.lookup_misses.is_empty());
    assert_eq!(run.assignments[0].patient_id, "EXTERNO");
}

#[test]
fn test_zero_age_weight_ties_keep_load_order() {
    let mut config = create_test_config(100, 0);
    config.weights.age = 0;

    let input = create_single_slot_input(vec![
        create_scored_patient("JOVEN", "C1", attributes(25, "medico")),
        create_scored_patient("MAYOR", "C1", attributes(65, "medico")),
    ]);
    assert_eq!(first_dose_patient(&config, input), "JOVEN");
}
