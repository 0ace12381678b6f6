use crate::error::ConstructionError;
use crate::generator::capability::CapabilityKind;
use crate::generator::crews::CrewBuilder;
use crate::generator::task::TaskDefinition;

pub const RESEARCH: &str = "research";
pub const ANALYSIS: &str = "analysis";
pub const PROPOSAL: &str = "proposal";

/// 调研 -> 分析 -> 撰写
pub fn tasks(crew: &CrewBuilder<'_>) -> Result<Vec<TaskDefinition>, ConstructionError> {
    let researcher = crew.agent(
        "Senior Research Specialist",
        "Investigate and gather information about {topic}",
        "An expert researcher with 15 years experience in academic and industrial research. \
         Known for thoroughness and accuracy.",
        &[CapabilityKind::WebSearch, CapabilityKind::Clock],
    )?;
    let analyst = crew.agent(
        "Lead Data Analyst",
        "Identify research gaps and opportunities in {topic}",
        "A data scientist specializing in trend analysis and research gap identification.",
        &[],
    )?;
    let writer = crew.agent(
        "Senior Research Proposal Writer",
        "Write compelling research proposals about {topic}",
        "A professional academic writer with 100+ successful grant proposals to major funding agencies.",
        &[],
    )?;

    Ok(vec![
        crew.task(
            RESEARCH,
            &researcher,
            "Conduct comprehensive research on {topic}.\n\
             Gather information from academic papers, industry reports, and news articles.",
            "A 1000-word research report with citations",
            &[],
        )?,
        crew.task(
            ANALYSIS,
            &analyst,
            "Analyze the research data to identify:\n\
             1. Key challenges in {topic}\n\
             2. Underexplored research opportunities\n\
             3. Potential societal impacts",
            "A structured analysis report with bullet points",
            &[RESEARCH],
        )?,
        crew.task(
            PROPOSAL,
            &writer,
            "Write a formal research proposal about {topic}\n\
             Include these sections:\n\
             1. Introduction and Background\n\
             2. Research Objectives\n\
             3. Methodology\n\
             4. Expected Outcomes\n\
             5. Budget Estimation\n\
             6. Ethical Considerations",
            "A 2000-word research proposal in Markdown format",
            &[ANALYSIS],
        )?,
    ])
}
