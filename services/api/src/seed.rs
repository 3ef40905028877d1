//! services/api/src/seed.rs
//!
//! Loads the word banks from CSV and creates the preset business courses.
//! Both steps skip what already exists, so the seed can be re-run.

use bizchinese_core::domain::{NewCourse, NewWord};
use bizchinese_core::ports::{DatabaseService, PortError, PortResult};
use serde::Deserialize;
use std::io::Read;
use tracing::{info, warn};

/// Frequency given to words whose row has none.
pub const DEFAULT_FREQUENCY: i32 = 3;
/// A preset course is only created when at least this many of its words exist.
pub const MIN_PRESET_WORDS: usize = 10;

/// One row of a word-bank CSV. Business and HSK files share the first three
/// columns; the rest are optional.
#[derive(Debug, Deserialize)]
struct WordRow {
    #[serde(rename = "汉字")]
    chinese: String,
    #[serde(rename = "拼音")]
    pinyin: String,
    #[serde(rename = "英文释义")]
    english: String,
    #[serde(rename = "场景标签", default)]
    scene: Option<String>,
    #[serde(rename = "例句", default)]
    example: Option<String>,
    #[serde(rename = "词频", default)]
    frequency: Option<String>,
    category: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parses a word-bank CSV with a header row. Rows without Chinese text or a
/// category are skipped.
pub fn parse_word_csv<R: Read>(reader: R) -> Result<Vec<NewWord>, csv::Error> {
    let mut words = Vec::new();
    for row in csv::Reader::from_reader(reader).deserialize::<WordRow>() {
        let row = row?;
        let chinese = row.chinese.trim().to_string();
        let category = row.category.trim().to_string();
        if chinese.is_empty() || category.is_empty() {
            warn!("Skipping incomplete word row: {:?}", row);
            continue;
        }
        words.push(NewWord {
            chinese,
            pinyin: row.pinyin.trim().to_string(),
            english: row.english.trim().to_string(),
            scene: non_empty(row.scene),
            example: non_empty(row.example),
            category,
            frequency: row
                .frequency
                .and_then(|f| f.trim().parse().ok())
                .unwrap_or(DEFAULT_FREQUENCY),
        });
    }
    Ok(words)
}

pub struct PresetCourse {
    pub title: &'static str,
    pub slug: &'static str,
    pub description: &'static str,
    pub difficulty: &'static str,
    pub words: &'static [&'static str],
}

pub const PRESET_COURSES: [PresetCourse; 5] = [
    PresetCourse {
        title: "Business Meeting Essentials",
        slug: "business-meeting",
        description: "Essential vocabulary for hosting and participating in Chinese business meetings.",
        difficulty: "intermediate",
        words: &[
            "会议", "议程", "主持", "发言", "讨论", "表决", "纪要", "会议室", "开会", "结束",
            "报告", "提问", "回答", "建议", "同意", "反对", "决定", "总结", "记录", "通知",
            "参加", "出席", "代表", "发表", "意见", "方案", "计划", "目标", "进度", "安排",
        ],
    },
    PresetCourse {
        title: "Business Email Writing",
        slug: "business-email",
        description: "Professional vocabulary for writing business emails in Chinese.",
        difficulty: "intermediate",
        words: &[
            "尊敬", "您好", "感谢", "回复", "收到", "附件", "转发", "抄送", "确认", "通知",
            "请求", "咨询", "反馈", "期待", "祝好", "顺祝", "商祺", "敬请", "查收", "审阅",
            "批准", "答复", "联系", "沟通", "合作", "洽谈", "协商", "安排", "事宜", "事项",
        ],
    },
    PresetCourse {
        title: "Business Negotiation",
        slug: "business-negotiation",
        description: "Key vocabulary for business negotiations and deal-making.",
        difficulty: "advanced",
        words: &[
            "谈判", "合同", "条款", "签订", "报价", "还价", "折扣", "利润", "成本", "预算",
            "付款", "交货", "质量", "数量", "期限", "违约", "赔偿", "保证", "承诺", "修改",
            "确认", "双方", "达成", "协议", "意向", "条件", "底线", "让步", "妥协", "成交",
        ],
    },
    PresetCourse {
        title: "Business Socializing",
        slug: "business-socializing",
        description: "Vocabulary for networking and business social events in China.",
        difficulty: "beginner",
        words: &[
            "名片", "交换", "认识", "介绍", "久仰", "幸会", "请教", "合作", "拜访", "接待",
            "款待", "宴请", "敬酒", "干杯", "随意", "客气", "招待", "欢迎", "告辞", "再见",
            "保重", "联系", "拜托", "麻烦", "感谢", "荣幸", "光临", "指教", "多谢", "不客气",
        ],
    },
    PresetCourse {
        title: "Office Daily Communication",
        slug: "office-daily",
        description: "Everyday office vocabulary for workplace communication.",
        difficulty: "beginner",
        words: &[
            "上班", "下班", "加班", "请假", "休假", "汇报", "任务", "完成", "进度", "问题",
            "解决", "帮助", "合作", "同事", "领导", "部门", "办公室", "电脑", "打印", "复印",
            "文件", "资料", "邮件", "电话", "开会", "安排", "提交", "审批", "通过", "修改",
        ],
    },
];

/// Creates each preset course that does not exist yet. Returns how many were created.
pub async fn seed_preset_courses(db: &dyn DatabaseService) -> PortResult<usize> {
    let mut created = 0;
    for preset in &PRESET_COURSES {
        match db.get_course_by_slug(preset.slug).await {
            Ok(_) => {
                info!("Course {} already exists, skipping", preset.slug);
                continue;
            }
            Err(PortError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let wanted: Vec<String> = preset.words.iter().map(|w| w.to_string()).collect();
        let matched = db.words_by_chinese(&wanted).await?;

        // Keep the preset's order and one entry per word.
        let mut word_ids = Vec::new();
        for chinese in preset.words {
            if let Some(word) = matched.iter().find(|w| w.chinese == *chinese) {
                if !word_ids.contains(&word.id) {
                    word_ids.push(word.id);
                }
            }
        }
        info!(
            "{}: found {}/{} words",
            preset.slug,
            word_ids.len(),
            preset.words.len()
        );
        if word_ids.len() < MIN_PRESET_WORDS {
            warn!("Not enough words for {}, skipping", preset.slug);
            continue;
        }

        let course = NewCourse {
            title: preset.title.to_string(),
            slug: preset.slug.to_string(),
            category: "business".to_string(),
            description: Some(preset.description.to_string()),
            difficulty: preset.difficulty.to_string(),
            is_custom: false,
            created_by: None,
            source_text: None,
            word_ids,
        };
        db.create_course(course, None).await?;
        created += 1;
    }
    Ok(created)
}
