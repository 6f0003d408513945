use super::domain::{CaseStatus, DeadlineEffect, DeadlineKind, DeadlineRule, DeadlineSpan};
use crate::config::WorkflowConfig;

/// Closing outcomes reachable from every open status.
const CLOSING: [CaseStatus; 3] = [
    CaseStatus::PaidInFull,
    CaseStatus::Settled,
    CaseStatus::Withdrawn,
];

#[derive(Debug, Clone)]
pub struct StatusTemplate {
    pub status: CaseStatus,
    pub allowed_next: Vec<CaseStatus>,
    pub deadlines: Vec<DeadlineRule>,
    pub requires_court_reference: bool,
    pub legal_reference: Option<&'static str>,
    pub guidance: &'static str,
}

#[derive(Debug, Clone)]
pub struct WorkflowBlueprint {
    templates: Vec<StatusTemplate>,
    expiry_warning_days: u32,
}

impl WorkflowBlueprint {
    pub fn standard(config: &WorkflowConfig) -> Self {
        Self {
            templates: standard_status_templates(config),
            expiry_warning_days: config.expiry_warning_days,
        }
    }

    pub fn template(&self, status: CaseStatus) -> &StatusTemplate {
        // Every status has exactly one template, in declaration order.
        &self.templates[status as usize]
    }

    pub fn allowed_next(&self, status: CaseStatus) -> &[CaseStatus] {
        &self.template(status).allowed_next
    }

    pub fn deadlines_for(&self, status: CaseStatus) -> &[DeadlineRule] {
        &self.template(status).deadlines
    }

    pub fn templates(&self) -> &[StatusTemplate] {
        &self.templates
    }

    pub fn expiry_warning_days(&self) -> u32 {
        self.expiry_warning_days
    }
}

fn open(next: &[CaseStatus]) -> Vec<CaseStatus> {
    next.iter().copied().chain(CLOSING).collect()
}

fn payment_window(config: &WorkflowConfig, gates: &[CaseStatus]) -> DeadlineRule {
    DeadlineRule {
        kind: DeadlineKind::PaymentWindow,
        span: DeadlineSpan::Days(config.reminder_payment_days),
        effect: DeadlineEffect::WaitBeforeEscalation,
        gates: gates.to_vec(),
    }
}

fn standard_status_templates(config: &WorkflowConfig) -> Vec<StatusTemplate> {
    use CaseStatus::*;

    let templates = vec![
        StatusTemplate {
            status: New,
            allowed_next: open(&[FirstReminder, DunningOrderApplied]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§286 BGB"),
            guidance: "Verify the claim and the debtor address, then send the first reminder. Debtors already in default may go straight to the court dunning procedure.",
        },
        StatusTemplate {
            status: FirstReminder,
            allowed_next: open(&[SecondReminder, FinalReminder, DunningOrderApplied]),
            deadlines: vec![payment_window(
                config,
                &[SecondReminder, FinalReminder, DunningOrderApplied],
            )],
            requires_court_reference: false,
            legal_reference: None,
            guidance: "Wait for the payment window to lapse before escalating.",
        },
        StatusTemplate {
            status: SecondReminder,
            allowed_next: open(&[FinalReminder, DunningOrderApplied]),
            deadlines: vec![payment_window(config, &[FinalReminder, DunningOrderApplied])],
            requires_court_reference: false,
            legal_reference: None,
            guidance: "Add reminder fees to the claim costs and set a fresh payment window.",
        },
        StatusTemplate {
            status: FinalReminder,
            allowed_next: open(&[DunningOrderApplied]),
            deadlines: vec![payment_window(config, &[DunningOrderApplied])],
            requires_court_reference: false,
            legal_reference: None,
            guidance: "Announce the court dunning procedure; apply for the Mahnbescheid once the window lapses.",
        },
        StatusTemplate {
            status: DunningOrderApplied,
            allowed_next: open(&[DunningOrderIssued]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§688 ZPO"),
            guidance: "Application filed with the central dunning court; await the issued order.",
        },
        StatusTemplate {
            status: DunningOrderIssued,
            allowed_next: open(&[DunningOrderServed]),
            deadlines: Vec::new(),
            requires_court_reference: true,
            legal_reference: Some("§692 ZPO"),
            guidance: "Record the court reference (Geschäftszeichen) and await notice of service.",
        },
        StatusTemplate {
            status: DunningOrderServed,
            allowed_next: open(&[EnforcementOrderApplied, Objection, DunningOrderApplied]),
            deadlines: vec![
                DeadlineRule {
                    kind: DeadlineKind::ObjectionPeriod,
                    span: DeadlineSpan::Days(config.objection_period_days),
                    effect: DeadlineEffect::WaitBeforeEscalation,
                    gates: vec![EnforcementOrderApplied],
                },
                DeadlineRule {
                    kind: DeadlineKind::DunningOrderValidity,
                    span: DeadlineSpan::Months(config.dunning_order_validity_months),
                    effect: DeadlineEffect::ExpiresEscalation,
                    gates: vec![EnforcementOrderApplied],
                },
            ],
            requires_court_reference: false,
            legal_reference: Some("§§692, 699, 701 ZPO"),
            guidance: "Apply for the Vollstreckungsbescheid after the objection period and before the order lapses; re-file if it has lapsed.",
        },
        StatusTemplate {
            status: Objection,
            allowed_next: open(&[ContentiousProceedings]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§694 ZPO"),
            guidance: "The debtor objected; decide whether to pursue contentious proceedings.",
        },
        StatusTemplate {
            status: EnforcementOrderApplied,
            allowed_next: open(&[EnforcementOrderIssued]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§699 ZPO"),
            guidance: "Await the issued Vollstreckungsbescheid.",
        },
        StatusTemplate {
            status: EnforcementOrderIssued,
            allowed_next: open(&[EnforcementOrderServed]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§699 ZPO"),
            guidance: "Await notice of service on the debtor.",
        },
        StatusTemplate {
            status: EnforcementOrderServed,
            allowed_next: open(&[EnforcementInitiated, Appeal]),
            deadlines: vec![DeadlineRule {
                kind: DeadlineKind::AppealPeriod,
                span: DeadlineSpan::Days(config.appeal_period_days),
                effect: DeadlineEffect::Informational,
                gates: Vec::new(),
            }],
            requires_court_reference: false,
            legal_reference: Some("§§700, 339 ZPO"),
            guidance: "The order is provisionally enforceable; enforcement may start while the appeal period runs.",
        },
        StatusTemplate {
            status: Appeal,
            allowed_next: open(&[ContentiousProceedings]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§700 ZPO"),
            guidance: "The debtor appealed; the matter moves to contentious proceedings.",
        },
        StatusTemplate {
            status: ContentiousProceedings,
            allowed_next: open(&[EnforcementInitiated]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§§696, 700 ZPO"),
            guidance: "Litigate the claim; enforce once a judgment is obtained.",
        },
        StatusTemplate {
            status: EnforcementInitiated,
            allowed_next: open(&[InstallmentPlan, Uncollectible]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§§704 ff. ZPO"),
            guidance: "Instruct the bailiff; agree installments or write off when enforcement fails.",
        },
        StatusTemplate {
            status: InstallmentPlan,
            allowed_next: open(&[EnforcementInitiated, Uncollectible]),
            deadlines: Vec::new(),
            requires_court_reference: false,
            legal_reference: Some("§802b ZPO"),
            guidance: "Track installments; resume enforcement when the debtor defaults on the plan.",
        },
        closed(PaidInFull, "Claim settled in full."),
        closed(Settled, "Closed by settlement agreement (Vergleich)."),
        closed(Uncollectible, "Written off after unsuccessful enforcement."),
        closed(Withdrawn, "Withdrawn on the Kreditor's instruction."),
    ];

    debug_assert!(templates
        .iter()
        .zip(CaseStatus::ordered())
        .all(|(template, status)| template.status == status));

    templates
}

fn closed(status: CaseStatus, guidance: &'static str) -> StatusTemplate {
    StatusTemplate {
        status,
        allowed_next: Vec::new(),
        deadlines: Vec::new(),
        requires_court_reference: false,
        legal_reference: None,
        guidance,
    }
}
