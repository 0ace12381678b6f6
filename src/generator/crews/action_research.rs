use crate::error::ConstructionError;
use crate::generator::capability::CapabilityKind;
use crate::generator::crews::CrewBuilder;
use crate::generator::task::TaskDefinition;

pub const RESEARCH: &str = "research";
pub const DESIGN: &str = "design";
pub const PROPOSAL: &str = "proposal";

const PROPOSAL_OUTLINE: &str = "Compile formal research proposal on {topic} using this structure:

RESEARCH PROPOSAL: [TOPIC]

1. INTRODUCTION
1.1 Background (Ghanaian education context)
1.2 Problem Statement
1.3 Purpose & Objectives

2. RESEARCH DESIGN
2.1 Action Research Approach
2.2 Target Group (Grade/Subject/School Type)
2.3 Data Collection Methods
2.4 Intervention Strategy

3. ETHICAL CONSIDERATIONS
3.1 Participant Consent
3.2 Data Privacy Measures

4. EXPECTED OUTCOMES
4.1 Anticipated Impacts
4.2 Relevance to Teacher Training

5. WORK PLAN
5.1 8-Week Timeline
5.2 Resource Requirements

References (APA format)";

/// 调研 -> 行动方案 -> 申请书（同时引用调研与方案）
pub fn tasks(crew: &CrewBuilder<'_>) -> Result<Vec<TaskDefinition>, ConstructionError> {
    let researcher = crew.agent(
        "Ghana Education Analyst",
        "Identify key issues in basic schools",
        "Expert in Ghana's primary education system",
        &[CapabilityKind::WebSearch],
    )?;
    let designer = crew.agent(
        "Action Research Specialist",
        "Create practical interventions for teacher trainees",
        "Experienced in classroom action research design",
        &[],
    )?;
    let writer = crew.agent(
        "Proposal Architect",
        "Structure proposals using academic guidelines",
        "Skilled in Ghanaian research formatting",
        &[],
    )?;

    Ok(vec![
        crew.task(
            RESEARCH,
            &researcher,
            "Investigate {topic} in Ghanaian basic schools.\n\
             Focus on:\n\
             - Current MOE/GES policies\n\
             - Common classroom challenges\n\
             - Relevant local case studies",
            "Bullet-point research summary with citations",
            &[],
        )?,
        crew.task(
            DESIGN,
            &designer,
            "Design action research plan for {topic}:\n\
             1. Define measurable objectives\n\
             2. Create 4-week intervention plan\n\
             3. Suggest assessment methods\n\
             4. Outline ethical considerations",
            "Structured action plan with timeline",
            &[RESEARCH],
        )?,
        crew.task(
            PROPOSAL,
            &writer,
            PROPOSAL_OUTLINE,
            "Full proposal document in Markdown",
            &[RESEARCH, DESIGN],
        )?,
    ])
}
