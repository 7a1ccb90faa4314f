use log::{debug, info};

use crate::error::{Error, Result};
use crate::package::Package;
use crate::spread::Spread;
use crate::util::increment_filename;

/// One page to append with [`Package::add_pages`].
pub struct PageRequest<'a> {
    pub source: &'a mut Package,
    /// 1-based page number in `source`.
    pub page_number: usize,
    /// Destination node receiving the page's content.
    pub at: String,
    /// Source node to graft.
    pub only: String,
}

impl Package {
    /// Append page `page_number` (1-based) of `src` after this package's
    /// last page, with the items placed on it, then graft `only` at `at`.
    ///
    /// When the last spread already ends with a recto page, a new empty
    /// spread is started. The page becomes the recto of a spread holding one
    /// page, or the verso of an empty one.
    pub fn add_page(
        &mut self,
        src: &mut Package,
        page_number: usize,
        at: &str,
        only: &str,
    ) -> Result<()> {
        let page = {
            let pages = src.pages()?;
            page_number
                .checked_sub(1)
                .and_then(|i| pages.get(i))
                .cloned()
                .ok_or(Error::PageOutOfRange {
                    requested: page_number,
                    available: pages.len(),
                })?
        };
        let (page_node, items) = src
            .spreads()?
            .iter()
            .find(|s| s.name == page.spread)
            .ok_or_else(|| Error::MissingMember(page.spread.clone()))?
            .page_with_items(&page)?;

        self.stage()?;
        let last_name = self
            .spread_names()?
            .last()
            .cloned()
            .ok_or_else(|| Error::MissingElement("spread in designmap.xml".to_string()))?;
        let last = self.spread(&last_name)?;
        let ends_with_recto = last.pages()?.last().is_some_and(|p| p.is_recto());
        let mut target = if ends_with_recto {
            self.add_new_spread(&last)?
        } else {
            last
        };

        let face = target.add_page(&page_node, &items)?;
        self.write_spread(&target)?;
        self.invalidate();
        info!(
            "page {page_number} added to {} as {face} with {} item(s)",
            target.name,
            items.len()
        );

        self.graft_content(src, at, only)?;
        self.merge_resources(src)?;
        self.invalidate();
        Ok(())
    }

    /// [`Package::add_page`] for each request, in order.
    pub fn add_pages<'a>(
        &mut self,
        requests: impl IntoIterator<Item = PageRequest<'a>>,
    ) -> Result<()> {
        for request in requests {
            self.add_page(
                request.source,
                request.page_number,
                &request.at,
                &request.only,
            )?;
        }
        Ok(())
    }

    /// Start an empty spread after `previous`, registered right after it.
    ///
    /// The new file is a copy of `previous` stripped of pages and items; its
    /// name is the first free increment of `previous`'s.
    fn add_new_spread(&mut self, previous: &Spread) -> Result<Spread> {
        let names = self.list_names()?;
        let mut name = increment_filename(&previous.name);
        while names.contains(&name) {
            name = increment_filename(&name);
        }

        let mut spread = Spread::new(name, previous.doc.clone());
        spread.clear()?;
        spread.sync_self_with_name()?;
        self.write_spread(&spread)?;

        let mut designmap = self.designmap()?;
        designmap.add_spread(&spread.name);
        self.write_designmap(&designmap)?;
        self.invalidate();
        debug!("new spread {} after {}", spread.name, previous.name);
        Ok(spread)
    }
}
